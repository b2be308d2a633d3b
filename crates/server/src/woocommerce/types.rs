//! WooCommerce product resource and request payloads.
//!
//! Only the fields this service reads or writes are typed. Everything else on
//! a product (`sku`, `permalink`, `categories`, ...) is carried in `extra` so
//! responses pass through to callers unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use woo_bridge_core::{ProductDraft, RemoteProductId, RemoteStatus};

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PER_PAGE: u32 = 50;

/// Status filter applied to listings unless overridden.
pub const DEFAULT_LIST_STATUS: RemoteStatus = RemoteStatus::Publish;

/// A product as returned by `/wp-json/wc/v3/products`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteProduct {
    pub id: RemoteProductId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Current price (sale price when on sale).
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub regular_price: String,
    /// Any WooCommerce status: `draft`, `pending`, `private`, `publish`, ...
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub images: Vec<RemoteImage>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RemoteProduct {
    /// First image URL, if any.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(|image| image.src.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteImage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub src: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One page of a product listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductPage {
    pub products: Vec<RemoteProduct>,
    /// `X-WP-Total` header.
    pub total: Option<u64>,
    /// `X-WP-TotalPages` header.
    pub total_pages: Option<u64>,
}

/// Caller-controlled listing filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
}

impl ListParams {
    /// Query pairs sent upstream: the caller's filters merged over
    /// `per_page=50&status=publish`.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            (
                "per_page",
                self.per_page.unwrap_or(DEFAULT_PER_PAGE).to_string(),
            ),
            ("status", DEFAULT_LIST_STATUS.as_str().to_owned()),
        ];
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_owned()));
        }
        pairs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    Simple,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRef {
    pub src: String,
}

/// Body for `POST /products` and `PUT /products/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductPayload {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub regular_price: String,
    pub status: RemoteStatus,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub product_type: Option<ProductType>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageRef>,
}

impl ProductPayload {
    /// Payload for creating a product: always a `simple` product.
    #[must_use]
    pub fn for_create(draft: &ProductDraft) -> Self {
        Self {
            product_type: Some(ProductType::Simple),
            ..Self::for_update(draft)
        }
    }

    /// Payload for updating a product; the product type is left alone.
    #[must_use]
    pub fn for_update(draft: &ProductDraft) -> Self {
        Self {
            name: draft.name.clone(),
            description: draft.description.clone(),
            regular_price: draft.price.to_remote_string(),
            status: draft.status,
            product_type: None,
            images: images_for(draft.image_url.as_deref()),
        }
    }
}

/// A single-element image list when a URL is set.
pub(crate) fn images_for(image_url: Option<&str>) -> Vec<ImageRef> {
    image_url
        .map(|src| ImageRef {
            src: src.to_owned(),
        })
        .into_iter()
        .collect()
}
