//! WooCommerce client errors.

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when talking to the WooCommerce REST API.
#[derive(Debug, Error)]
pub enum WooCommerceError {
    /// Transport failure (connect, timeout, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API error {status}: {message}")]
    Api {
        status: u16,
        /// WooCommerce error code, e.g. `woocommerce_rest_cannot_create`.
        code: Option<String>,
        message: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    /// Rejected credentials (401/403).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A success response whose body did not match the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The configured store URL cannot be turned into an endpoint.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// WooCommerce's JSON error body:
/// `{"code": "...", "message": "...", "data": {"status": 400}}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
}

impl WooCommerceError {
    /// Classify a failed response from its status code and raw body.
    #[must_use]
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<ErrorBody>(body).ok();
        let code = parsed.as_ref().and_then(|b| b.code.clone());
        let message = parsed
            .and_then(|b| b.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    format!("HTTP status {status}")
                } else {
                    trimmed.to_owned()
                }
            });

        match status {
            404 => Self::NotFound(message),
            401 | 403 => Self::Unauthorized(message),
            _ => Self::Api {
                status,
                code,
                message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_woocommerce_error_body_is_parsed() {
        let body = r#"{"code":"woocommerce_rest_product_invalid_id","message":"Invalid ID.","data":{"status":404}}"#;
        let err = WooCommerceError::from_response(404, body);
        assert!(matches!(err, WooCommerceError::NotFound(ref m) if m == "Invalid ID."));
    }

    #[test]
    fn test_api_error_keeps_code() {
        let body = r#"{"code":"rest_invalid_param","message":"Invalid parameter(s): regular_price"}"#;
        match WooCommerceError::from_response(400, body) {
            WooCommerceError::Api {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 400);
                assert_eq!(code.as_deref(), Some("rest_invalid_param"));
                assert_eq!(message, "Invalid parameter(s): regular_price");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_non_json_body_falls_back_to_text() {
        let err = WooCommerceError::from_response(502, "Bad Gateway");
        assert_eq!(err.to_string(), "API error 502: Bad Gateway");

        let err = WooCommerceError::from_response(500, "");
        assert_eq!(err.to_string(), "API error 500: HTTP status 500");
    }

    #[test]
    fn test_auth_failures() {
        let body = r#"{"code":"woocommerce_rest_cannot_view","message":"Sorry, you cannot list resources."}"#;
        assert!(matches!(
            WooCommerceError::from_response(401, body),
            WooCommerceError::Unauthorized(_)
        ));
    }
}
