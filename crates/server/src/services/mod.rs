//! Business logic services.
//!
//! - `auth` - accounts and bearer tokens
//! - `products` - remote product operations and mirror upkeep

pub mod auth;
pub mod products;

pub use auth::{AuthError, AuthService};
pub use products::{ProductOperation, ProductService, ProductServiceError};
