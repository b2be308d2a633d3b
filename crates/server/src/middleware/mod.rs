//! HTTP middleware and extractors.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction per route)
//! 2. `TraceLayer` (`http_request` span)
//! 3. Request ID (recorded on the span, echoed in the response)

pub mod auth;
pub mod request_id;

pub use auth::{CurrentUser, RequireAuth};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
