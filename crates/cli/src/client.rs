//! HTTP client for the woo-bridge API.
//!
//! Attaches the stored bearer token to every request. Any 401 clears the
//! stored session and surfaces as [`ClientError::Unauthenticated`], so callers
//! only need to tell the user to log in again.

use std::collections::BTreeMap;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use url::Url;

use crate::token_store::{TokenStore, TokenStoreError};

/// API base used when `WOO_BRIDGE_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server rejected or did not receive a token; the session is cleared.
    #[error("{0}")]
    Unauthenticated(String),

    /// Input failed server-side validation.
    #[error("{message}")]
    Validation {
        message: String,
        errors: BTreeMap<String, Vec<String>>,
    },

    /// Any other non-success response.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error(transparent)]
    Session(#[from] TokenStoreError),
}

/// The account as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiUser {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// A remote product. Fields beyond the common ones are kept in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub regular_price: String,
    #[serde(default)]
    pub status: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    pub total: Option<u64>,
    pub total_pages: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub user: ApiUser,
    pub token: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct UserResponse {
    pub user: ApiUser,
}

#[derive(Debug, Deserialize)]
pub struct ProductListResponse {
    pub products: Vec<Product>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ProductResponse {
    pub product: Product,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: BTreeMap<String, Vec<String>>,
}

/// Body for `POST /register`.
#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_confirmation: Option<&'a str>,
}

/// Body for `POST /products` and `PUT /products/{id}`.
#[derive(Debug, Default, Serialize)]
pub struct ProductRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Listing filters for `GET /products`.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
}

/// Client for the woo-bridge API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    tokens: TokenStore,
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns an error if `base_url` is not a URL or the HTTP client fails
    /// to build.
    pub fn new(base_url: &str, tokens: TokenStore) -> Result<Self, ClientError> {
        // Url::join needs the trailing slash to keep the `/api` segment
        let base_url = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url,
            tokens,
        })
    }

    #[must_use]
    pub const fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// `POST /register`, storing the issued token and user.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` when the server rejects the input.
    pub async fn register(&self, request: &RegisterRequest<'_>) -> Result<AuthResponse, ClientError> {
        let response: AuthResponse = self
            .send(Method::POST, "register", &[], Some(request))
            .await?;
        self.remember(&response)?;
        Ok(response)
    }

    /// `POST /login`, storing the issued token and user.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Unauthenticated` for wrong credentials.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ClientError> {
        #[derive(Serialize)]
        struct Login<'a> {
            email: &'a str,
            password: &'a str,
        }

        let response: AuthResponse = self
            .send(Method::POST, "login", &[], Some(&Login { email, password }))
            .await?;
        self.remember(&response)?;
        Ok(response)
    }

    /// `POST /logout`. The local session is cleared even if the call fails.
    ///
    /// # Errors
    ///
    /// Returns the request error after clearing the session.
    pub async fn logout(&self) -> Result<MessageResponse, ClientError> {
        let result = self
            .send::<MessageResponse, ()>(Method::POST, "logout", &[], None)
            .await;
        self.tokens.clear()?;
        result
    }

    /// `GET /user`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Unauthenticated` without a valid session.
    pub async fn get_user(&self) -> Result<ApiUser, ClientError> {
        let response: UserResponse = self.send::<_, ()>(Method::GET, "user", &[], None).await?;
        Ok(response.user)
    }

    /// `GET /products`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` when the store call fails.
    pub async fn get_products(
        &self,
        query: &ProductQuery,
    ) -> Result<ProductListResponse, ClientError> {
        let mut pairs = Vec::new();
        if let Some(page) = query.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(per_page) = query.per_page {
            pairs.push(("per_page", per_page.to_string()));
        }
        if let Some(search) = &query.search {
            pairs.push(("search", search.clone()));
        }

        self.send::<_, ()>(Method::GET, "products", &pairs, None)
            .await
    }

    /// `GET /products/{id}`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` when the product cannot be fetched.
    pub async fn get_product(&self, id: i64) -> Result<ProductResponse, ClientError> {
        self.send::<_, ()>(Method::GET, &format!("products/{id}"), &[], None)
            .await
    }

    /// `POST /products`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` for rejected input.
    pub async fn create_product(
        &self,
        request: &ProductRequest,
    ) -> Result<ProductResponse, ClientError> {
        self.send(Method::POST, "products", &[], Some(request))
            .await
    }

    /// `PUT /products/{id}`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` for rejected input.
    pub async fn update_product(
        &self,
        id: i64,
        request: &ProductRequest,
    ) -> Result<ProductResponse, ClientError> {
        self.send(Method::PUT, &format!("products/{id}"), &[], Some(request))
            .await
    }

    /// `DELETE /products/{id}`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` when the delete fails.
    pub async fn delete_product(&self, id: i64) -> Result<MessageResponse, ClientError> {
        self.send::<_, ()>(Method::DELETE, &format!("products/{id}"), &[], None)
            .await
    }

    fn remember(&self, response: &AuthResponse) -> Result<(), ClientError> {
        self.tokens.set_token(&response.token)?;
        self.tokens.set_user(&response.user)?;
        Ok(())
    }

    async fn send<T, B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut url = self.base_url.join(path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        let mut request = self.http.request(method, url);
        if let Some(token) = self.tokens.token()? {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let text = response.text().await.unwrap_or_default();
        let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
        let message = body
            .message
            .unwrap_or_else(|| format!("HTTP status {}", status.as_u16()));

        match status {
            StatusCode::UNAUTHORIZED => {
                tracing::debug!("Session rejected, clearing stored token");
                self.tokens.clear()?;
                Err(ClientError::Unauthenticated(message))
            }
            StatusCode::UNPROCESSABLE_ENTITY => Err(ClientError::Validation {
                message,
                errors: body.errors,
            }),
            _ => Err(ClientError::Api {
                status: status.as_u16(),
                message,
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Json, Router,
        http::{HeaderMap as AxumHeaders, StatusCode as AxumStatus},
        routing::{get, post},
    };
    use serde_json::json;

    use super::*;

    fn temp_tokens() -> TokenStore {
        TokenStore::new(std::env::temp_dir().join(format!(
            "woo-bridge-client-{}.json",
            uuid::Uuid::new_v4()
        )))
    }

    async fn user_handler(headers: AxumHeaders) -> (AxumStatus, Json<Value>) {
        let authorized = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            == Some("Bearer 1|good");
        if authorized {
            (
                AxumStatus::OK,
                Json(json!({
                    "success": true,
                    "user": {"id": 1, "name": "Ada", "email": "ada@example.com", "created_at": "2025-01-01T00:00:00Z"},
                    "message": "User fetched successfully"
                })),
            )
        } else {
            (
                AxumStatus::UNAUTHORIZED,
                Json(json!({"success": false, "message": "Unauthenticated."})),
            )
        }
    }

    async fn create_handler(Json(body): Json<Value>) -> (AxumStatus, Json<Value>) {
        if body.get("name").is_none() {
            return (
                AxumStatus::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "success": false,
                    "message": "The name field is required.",
                    "errors": {"name": ["The name field is required."]}
                })),
            );
        }
        (
            AxumStatus::CREATED,
            Json(json!({
                "success": true,
                "product": {"id": 77, "name": body["name"], "regular_price": body["price"], "status": "draft", "sku": ""},
                "message": "Product created successfully in WooCommerce"
            })),
        )
    }

    async fn spawn_api() -> String {
        let app = Router::new()
            .route("/api/user", get(user_handler))
            .route("/api/products", post(create_handler))
            .route(
                "/api/products/{id}",
                get(|| async {
                    (
                        AxumStatus::INTERNAL_SERVER_ERROR,
                        Json(json!({"success": false, "message": "Failed to fetch product: Not found: Invalid ID."})),
                    )
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/api")
    }

    #[tokio::test]
    async fn test_token_is_sent() {
        let tokens = temp_tokens();
        tokens.set_token("1|good").unwrap();
        let client = ApiClient::new(&spawn_api().await, tokens.clone()).unwrap();

        let user = client.get_user().await.unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(tokens.token().unwrap().as_deref(), Some("1|good"));
        tokens.clear().unwrap();
    }

    #[tokio::test]
    async fn test_unauthorized_clears_session() {
        let tokens = temp_tokens();
        tokens.set_token("1|stale").unwrap();
        tokens
            .set_user(&ApiUser {
                id: 1,
                name: "Ada".to_owned(),
                email: "ada@example.com".to_owned(),
            })
            .unwrap();
        let client = ApiClient::new(&spawn_api().await, tokens.clone()).unwrap();

        let err = client.get_user().await.unwrap_err();

        assert!(matches!(err, ClientError::Unauthenticated(ref m) if m == "Unauthenticated."));
        assert_eq!(tokens.token().unwrap(), None);
        assert_eq!(tokens.stored_user().unwrap(), None);
    }

    #[tokio::test]
    async fn test_validation_errors_are_kept() {
        let tokens = temp_tokens();
        let client = ApiClient::new(&spawn_api().await, tokens).unwrap();

        let err = client
            .send::<ProductResponse, _>(Method::POST, "products", &[], Some(&json!({"price": "1"})))
            .await
            .unwrap_err();

        match err {
            ClientError::Validation { message, errors } => {
                assert_eq!(message, "The name field is required.");
                assert_eq!(errors["name"], vec!["The name field is required."]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_product() {
        let tokens = temp_tokens();
        let client = ApiClient::new(&spawn_api().await, tokens).unwrap();

        let response = client
            .create_product(&ProductRequest {
                name: "Widget".to_owned(),
                price: "9.99".to_owned(),
                ..ProductRequest::default()
            })
            .await
            .unwrap();

        assert_eq!(response.product.id, 77);
        assert_eq!(response.product.regular_price, "9.99");
        assert_eq!(response.message, "Product created successfully in WooCommerce");
    }

    #[tokio::test]
    async fn test_server_error_message_is_surfaced() {
        let tokens = temp_tokens();
        let client = ApiClient::new(&spawn_api().await, tokens).unwrap();

        let err = client.get_product(404).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "API error 500: Failed to fetch product: Not found: Invalid ID."
        );
    }

    #[test]
    fn test_base_url_keeps_api_segment() {
        let client = ApiClient::new("http://localhost:8000/api", temp_tokens()).unwrap();
        assert_eq!(
            client.base_url.join("products/5").unwrap().as_str(),
            "http://localhost:8000/api/products/5"
        );
    }
}
