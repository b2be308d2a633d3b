//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Errors render as the JSON
//! envelope `{"success": false, "message": ..., "errors": {...}}`, with
//! `errors` present only for validation failures. Server errors are captured
//! to Sentry before responding.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use woo_bridge_core::ValidationErrors;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::products::ProductServiceError;

/// Message returned to clients for any 500 that is not a remote failure.
const INTERNAL_MESSAGE: &str = "Internal server error";

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request input failed validation.
    #[error("{}", .0.summary())]
    Validation(ValidationErrors),

    /// Missing or invalid bearer token.
    #[error("Unauthenticated.")]
    Unauthenticated,

    /// Login with a wrong email or password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),

    /// A product operation failed.
    #[error(transparent)]
    Product(#[from] ProductServiceError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<ValidationErrors>,
}

impl AppError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthenticated | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Product(_) | Self::Database(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let (message, errors) = match self {
            Self::Validation(errors) => (errors.summary(), Some(errors)),
            // Remote failures pass their message through; nothing else does.
            Self::Product(ref err @ ProductServiceError::Remote { .. }) => (err.to_string(), None),
            Self::Product(ProductServiceError::Mirror(_))
            | Self::Database(_)
            | Self::Internal(_) => (INTERNAL_MESSAGE.to_owned(), None),
            other => (other.to_string(), None),
        };

        let body = ErrorBody {
            success: false,
            message,
            errors,
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(errors) => Self::Validation(errors),
            AuthError::InvalidCredentials => Self::InvalidCredentials,
            AuthError::Unauthenticated => Self::Unauthenticated,
            AuthError::Repository(e) => Self::Database(e),
            AuthError::PasswordHash => Self::Internal("password hashing failed".to_owned()),
        }
    }
}

/// Unreadable JSON bodies are reported like any other validation failure.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add("body", rejection.body_text());
        Self::Validation(errors)
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the current request.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::services::products::ProductOperation;
    use crate::woocommerce::WooCommerceError;

    async fn render(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_error_lists_fields() {
        let mut errors = ValidationErrors::new();
        errors.add("name", "The name field is required.");
        errors.add("price", "The price field must be at least 0.");

        let (status, body) = render(AppError::Validation(errors)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["message"], "The name field is required. (and 1 more error)");
        assert_eq!(
            body["errors"],
            json!({
                "name": ["The name field is required."],
                "price": ["The price field must be at least 0."]
            })
        );
    }

    #[tokio::test]
    async fn test_remote_failure_keeps_message() {
        let err = AppError::Product(ProductServiceError::Remote {
            operation: ProductOperation::Get,
            source: WooCommerceError::NotFound("Invalid ID.".to_owned()),
        });

        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({"success": false, "message": "Failed to fetch product: Not found: Invalid ID."})
        );
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let (status, body) = render(AppError::Internal("pool exhausted".to_owned())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], INTERNAL_MESSAGE);
        assert!(body.get("errors").is_none());
    }

    #[tokio::test]
    async fn test_unauthenticated_body() {
        let (status, body) = render(AppError::Unauthenticated).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"success": false, "message": "Unauthenticated."}));
    }

    #[test]
    fn test_auth_errors_map_to_http_kinds() {
        assert!(matches!(
            AppError::from(AuthError::InvalidCredentials),
            AppError::InvalidCredentials
        ));
        assert!(matches!(
            AppError::from(AuthError::PasswordHash),
            AppError::Internal(_)
        ));
        assert_eq!(
            AppError::from(AuthError::Unauthenticated).status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
