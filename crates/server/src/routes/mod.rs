//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                  - Liveness check
//! GET  /health/ready            - Readiness check (database)
//!
//! # Auth
//! POST   /api/register          - Create an account, returns a token
//! POST   /api/login             - Exchange credentials for a token
//! POST   /api/logout            - Revoke the current token (auth)
//! GET    /api/user              - Current user (auth)
//!
//! # Products (auth, proxied to WooCommerce)
//! GET    /api/products          - List
//! POST   /api/products          - Create
//! GET    /api/products/{id}     - Fetch
//! PUT    /api/products/{id}     - Update
//! DELETE /api/products/{id}     - Delete (permanent)
//! ```

pub mod auth;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};
use serde::Serialize;

use crate::state::AppState;

/// `{"success": true, "message": ...}` for operations with nothing to return.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}

impl MessageResponse {
    #[must_use]
    pub const fn new(message: &'static str) -> Self {
        Self {
            success: true,
            message,
        }
    }
}

/// Create the `/api` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/user", get(auth::user))
        .route("/products", get(products::index).post(products::store))
        .route(
            "/products/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::destroy),
        )
}

/// Build the complete router, with `/api` nested.
pub fn routes() -> Router<AppState> {
    Router::new().nest("/api", api_routes())
}
