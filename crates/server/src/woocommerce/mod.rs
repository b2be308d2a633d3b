//! WooCommerce REST API client.
//!
//! Talks to the product endpoints of a WooCommerce store. The store is the
//! source of truth for product data; this client only forwards requests.
//!
//! # API Reference
//!
//! - Base URL: `{store}/wp-json/{version}` (version `wc/v3` by default)
//! - Authentication: HTTP Basic with the consumer key and secret
//! - Pagination: `X-WP-Total` and `X-WP-TotalPages` response headers
//!
//! Requests use a fixed timeout. There are no retries.

mod error;
mod types;

pub use error::WooCommerceError;
pub use types::*;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use url::Url;

use woo_bridge_core::RemoteProductId;

use crate::config::WooCommerceConfig;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// The five product operations of the remote store.
///
/// Route handlers and the mirror sync only see this trait, so tests can swap
/// the store for an in-memory fake.
#[async_trait]
pub trait ProductGateway: Send + Sync {
    /// `GET /products` with the caller's filters merged over the defaults.
    async fn list(&self, params: &ListParams) -> Result<ProductPage, WooCommerceError>;

    /// `GET /products/{id}`.
    async fn get(&self, id: RemoteProductId) -> Result<RemoteProduct, WooCommerceError>;

    /// `POST /products`.
    async fn create(&self, payload: &ProductPayload) -> Result<RemoteProduct, WooCommerceError>;

    /// `PUT /products/{id}`.
    async fn update(
        &self,
        id: RemoteProductId,
        payload: &ProductPayload,
    ) -> Result<RemoteProduct, WooCommerceError>;

    /// `DELETE /products/{id}?force=true`, bypassing the trash.
    async fn delete(&self, id: RemoteProductId) -> Result<RemoteProduct, WooCommerceError>;
}

/// WooCommerce REST API client. Cheap to clone.
#[derive(Clone)]
pub struct WooCommerceClient {
    inner: Arc<WooCommerceClientInner>,
}

struct WooCommerceClientInner {
    client: reqwest::Client,
    base_url: Url,
    consumer_key: SecretString,
    consumer_secret: SecretString,
}

impl WooCommerceClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL cannot be built or the HTTP client fails
    /// to build.
    pub fn new(config: &WooCommerceConfig) -> Result<Self, WooCommerceError> {
        let base_url = api_base_url(&config.store_url, &config.api_version)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(WooCommerceClientInner {
                client,
                base_url,
                consumer_key: config.consumer_key.clone(),
                consumer_secret: config.consumer_secret.clone(),
            }),
        })
    }

    /// Absolute URL of an endpoint below the API base, e.g. `products/12`.
    fn endpoint(&self, path: &str) -> Result<Url, WooCommerceError> {
        Ok(self.inner.base_url.join(path)?)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.basic_auth(
            self.inner.consumer_key.expose_secret(),
            Some(self.inner.consumer_secret.expose_secret()),
        )
    }

    /// Send a request and decode a success body, keeping the headers.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<(T, HeaderMap), WooCommerceError> {
        let response = self.authorized(request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = WooCommerceError::from_response(status.as_u16(), &body);
            tracing::warn!(status = status.as_u16(), error = %err, "WooCommerce request failed");
            return Err(err);
        }

        let headers = response.headers().clone();
        let body = response
            .json::<T>()
            .await
            .map_err(|e| WooCommerceError::Parse(format!("Failed to parse response: {e}")))?;
        Ok((body, headers))
    }
}

#[async_trait]
impl ProductGateway for WooCommerceClient {
    async fn list(&self, params: &ListParams) -> Result<ProductPage, WooCommerceError> {
        let mut url = self.endpoint("products")?;
        url.query_pairs_mut().extend_pairs(params.query_pairs());

        let (products, headers) = self
            .execute::<Vec<RemoteProduct>>(self.inner.client.get(url))
            .await?;

        Ok(ProductPage {
            products,
            total: header_u64(&headers, "x-wp-total"),
            total_pages: header_u64(&headers, "x-wp-totalpages"),
        })
    }

    async fn get(&self, id: RemoteProductId) -> Result<RemoteProduct, WooCommerceError> {
        let url = self.endpoint(&format!("products/{id}"))?;
        let (product, _) = self.execute(self.inner.client.get(url)).await?;
        Ok(product)
    }

    async fn create(&self, payload: &ProductPayload) -> Result<RemoteProduct, WooCommerceError> {
        let url = self.endpoint("products")?;
        let (product, _) = self
            .execute(self.inner.client.post(url).json(payload))
            .await?;
        Ok(product)
    }

    async fn update(
        &self,
        id: RemoteProductId,
        payload: &ProductPayload,
    ) -> Result<RemoteProduct, WooCommerceError> {
        let url = self.endpoint(&format!("products/{id}"))?;
        let (product, _) = self
            .execute(self.inner.client.put(url).json(payload))
            .await?;
        Ok(product)
    }

    async fn delete(&self, id: RemoteProductId) -> Result<RemoteProduct, WooCommerceError> {
        let mut url = self.endpoint(&format!("products/{id}"))?;
        url.query_pairs_mut().append_pair("force", "true");
        let (product, _) = self.execute(self.inner.client.delete(url)).await?;
        Ok(product)
    }
}

impl std::fmt::Debug for WooCommerceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WooCommerceClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

/// `{store}/wp-json/{version}/`, with the trailing slash `Url::join` needs.
fn api_base_url(store_url: &Url, api_version: &str) -> Result<Url, url::ParseError> {
    let store = store_url.as_str().trim_end_matches('/');
    let version = api_version.trim_matches('/');
    Url::parse(&format!("{store}/wp-json/{version}/"))
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}
