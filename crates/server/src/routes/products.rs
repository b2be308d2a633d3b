//! Product route handlers.
//!
//! Every handler validates first, then calls the remote store. Nothing here
//! reads the local mirror; it is only written as a side effect.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde::Serialize;

use woo_bridge_core::{ProductInput, RemoteProductId};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::state::AppState;
use crate::woocommerce::{ListParams, RemoteProduct};

use super::MessageResponse;

/// Totals reported by the store for a listing.
#[derive(Debug, Serialize)]
pub struct Pagination {
    pub total: Option<u64>,
    pub total_pages: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub success: bool,
    pub products: Vec<RemoteProduct>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub success: bool,
    pub product: RemoteProduct,
    pub message: &'static str,
}

impl ProductResponse {
    const fn new(product: RemoteProduct, message: &'static str) -> Self {
        Self {
            success: true,
            product,
            message,
        }
    }
}

/// List products.
///
/// GET /api/products?page=&per_page=&search=
///
/// # Errors
///
/// Returns 400 for a malformed query and 500 if the store call fails.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(_current): RequireAuth,
    query: std::result::Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<ProductListResponse>> {
    let Query(params) = query?;

    let page = state.products().list(&params).await?;

    let pagination = (page.total.is_some() || page.total_pages.is_some()).then_some(Pagination {
        total: page.total,
        total_pages: page.total_pages,
    });

    Ok(Json(ProductListResponse {
        success: true,
        products: page.products,
        pagination,
        message: "WooCommerce products fetched successfully",
    }))
}

/// Create a product.
///
/// POST /api/products
///
/// # Errors
///
/// Returns 422 for invalid input and 500 if the store call fails.
pub async fn store(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    body: std::result::Result<Json<ProductInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ProductResponse>)> {
    let Json(input) = body?;
    let draft = input.validate()?;

    let product = state.products().create(current.user.id, &draft).await?;

    Ok((
        StatusCode::CREATED,
        Json(ProductResponse::new(
            product,
            "Product created successfully in WooCommerce",
        )),
    ))
}

/// Fetch one product.
///
/// GET /api/products/{id}
///
/// # Errors
///
/// Returns 400 for a non-numeric id and 500 if the store call fails.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(_current): RequireAuth,
    id: std::result::Result<Path<RemoteProductId>, PathRejection>,
) -> Result<Json<ProductResponse>> {
    let Path(id) = id?;

    let product = state.products().get(id).await?;

    Ok(Json(ProductResponse::new(
        product,
        "Product fetched successfully",
    )))
}

/// Replace a product's editable fields.
///
/// PUT /api/products/{id}
///
/// # Errors
///
/// Returns 400 for a non-numeric id, 422 for invalid input and 500 if the
/// store call fails.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(_current): RequireAuth,
    id: std::result::Result<Path<RemoteProductId>, PathRejection>,
    body: std::result::Result<Json<ProductInput>, JsonRejection>,
) -> Result<Json<ProductResponse>> {
    let Path(id) = id?;
    let Json(input) = body?;
    let draft = input.validate()?;

    let product = state.products().update(id, &draft).await?;

    Ok(Json(ProductResponse::new(
        product,
        "Product updated successfully in WooCommerce",
    )))
}

/// Permanently delete a product.
///
/// DELETE /api/products/{id}
///
/// # Errors
///
/// Returns 400 for a non-numeric id and 500 if the store call fails.
pub async fn destroy(
    State(state): State<AppState>,
    RequireAuth(_current): RequireAuth,
    id: std::result::Result<Path<RemoteProductId>, PathRejection>,
) -> Result<Json<MessageResponse>> {
    let Path(id) = id?;

    state.products().delete(id).await?;

    Ok(Json(MessageResponse::new(
        "Product deleted successfully from WooCommerce",
    )))
}
