//! Account route handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Serialize;

use crate::error::{Result, clear_sentry_user};
use crate::middleware::RequireAuth;
use crate::models::user::User;
use crate::services::auth::{IssuedToken, LoginInput, RegisterInput};
use crate::state::AppState;

use super::MessageResponse;

/// Response carrying a newly issued token.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub user: User,
    pub token: String,
    pub token_type: &'static str,
    pub message: &'static str,
}

impl AuthResponse {
    fn new(issued: IssuedToken, message: &'static str) -> Self {
        Self {
            success: true,
            user: issued.user,
            token: issued.token,
            token_type: "Bearer",
            message,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub success: bool,
    pub user: User,
    pub message: &'static str,
}

/// POST /api/register
///
/// # Errors
///
/// Returns 422 for invalid input or an email that is already taken.
pub async fn register(
    State(state): State<AppState>,
    body: std::result::Result<Json<RegisterInput>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let Json(input) = body?;

    let issued = state.auth().register(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse::new(issued, "User registered successfully")),
    ))
}

/// POST /api/login
///
/// # Errors
///
/// Returns 422 for missing fields and 401 for wrong credentials.
pub async fn login(
    State(state): State<AppState>,
    body: std::result::Result<Json<LoginInput>, JsonRejection>,
) -> Result<Json<AuthResponse>> {
    let Json(input) = body?;

    let issued = state.auth().login(input).await?;
    tracing::info!(user_id = %issued.user.id, "User logged in");

    Ok(Json(AuthResponse::new(issued, "Login successful")))
}

/// POST /api/logout
///
/// Revokes only the token used on this request.
///
/// # Errors
///
/// Returns 500 if the token cannot be deleted.
pub async fn logout(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<MessageResponse>> {
    state.auth().logout(current.token_id).await?;
    clear_sentry_user();

    Ok(Json(MessageResponse::new("Logged out successfully")))
}

/// GET /api/user
pub async fn user(RequireAuth(current): RequireAuth) -> Json<UserResponse> {
    Json(UserResponse {
        success: true,
        user: current.user,
        message: "User fetched successfully",
    })
}
