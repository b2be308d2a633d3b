//! Core types for woo-bridge.

pub mod email;
pub mod id;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError};
pub use status::{MirrorStatus, RemoteStatus, UnknownStatus};
