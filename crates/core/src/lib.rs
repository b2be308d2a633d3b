//! woo-bridge core - shared domain types.
//!
//! Used by:
//! - `server` - the HTTP service proxying product operations to WooCommerce
//! - `cli` - migrations, mirror push and the API client
//!
//! # Architecture
//!
//! The core crate contains only types and pure validation - no I/O, no
//! database access, no HTTP clients.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails and statuses
//! - [`product`] - Product request input and its validation rules
//! - [`validation`] - Per-field validation error collection

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod product;
pub mod types;
pub mod validation;

pub use product::{ProductDraft, ProductInput};
pub use types::*;
pub use validation::ValidationErrors;
