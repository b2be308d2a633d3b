//! Bearer token authentication extractor.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use woo_bridge_core::TokenId;

use crate::error::{AppError, set_sentry_user};
use crate::models::user::User;
use crate::state::AppState;

/// The authenticated caller and the token they used.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub token_id: TokenId,
}

/// Extractor that requires a valid `Authorization: Bearer` token.
///
/// Rejects with `401 {"success": false, "message": "Unauthenticated."}`.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(current): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", current.user.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let bearer = bearer_token(parts).ok_or(AppError::Unauthenticated)?;

        let (user, token_id) = state.auth().authenticate(bearer).await?;
        set_sentry_user(&user.id, Some(user.email.as_str()));

        Ok(Self(CurrentUser { user, token_id }))
    }
}

/// The token from an `Authorization: Bearer <token>` header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token.trim()).filter(|t| !t.is_empty())
}
