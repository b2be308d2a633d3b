//! Local product mirror.
//!
//! A mirror row is a denormalized copy of a remote product, kept for
//! reference only. It is never read back to answer API requests and may drift
//! from the store at any time.

use chrono::{DateTime, Utc};
use serde::Serialize;

use woo_bridge_core::{MirrorId, MirrorStatus, Price, RemoteProductId, UserId};

use crate::woocommerce::{ProductPayload, RemoteProduct, images_for};

/// A row of the `products` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ProductMirror {
    pub id: MirrorId,
    /// User whose request created the row.
    pub user_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub image_url: Option<String>,
    pub status: MirrorStatus,
    /// Null until the first successful remote create.
    #[sqlx(rename = "wc_product_id")]
    pub remote_id: Option<RemoteProductId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductMirror {
    /// Remote payload for pushing this row to the store.
    ///
    /// Carries no product type, so a create through this path leaves the
    /// store's default in place.
    #[must_use]
    pub fn to_payload(&self) -> ProductPayload {
        ProductPayload {
            name: self.name.clone(),
            description: self.description.clone(),
            regular_price: self.price.to_remote_string(),
            status: self.status.to_remote(),
            product_type: None,
            images: images_for(self.image_url.as_deref()),
        }
    }
}

/// The mirrored subset of a remote product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorFields {
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub image_url: Option<String>,
    pub status: MirrorStatus,
}

impl MirrorFields {
    /// Copy the mirrored fields out of a remote product.
    ///
    /// The price is the regular price when set, otherwise the current price;
    /// blank or unparseable prices become zero.
    #[must_use]
    pub fn from_remote(product: &RemoteProduct) -> Self {
        let price_text = if product.regular_price.trim().is_empty() {
            &product.price
        } else {
            &product.regular_price
        };

        Self {
            name: product.name.clone(),
            description: Some(product.description.clone()).filter(|d| !d.is_empty()),
            price: Price::from_remote_lossy(price_text),
            image_url: product.primary_image().map(str::to_owned),
            status: MirrorStatus::from_remote(&product.status),
        }
    }
}

/// Insert parameters for a new mirror row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMirror {
    pub user_id: UserId,
    pub remote_id: RemoteProductId,
    pub fields: MirrorFields,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn remote(body: serde_json::Value) -> RemoteProduct {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_fields_from_published_product() {
        let fields = MirrorFields::from_remote(&remote(json!({
            "id": 5,
            "name": "Mug",
            "description": "Holds coffee",
            "price": "7.50",
            "regular_price": "9.00",
            "status": "publish",
            "images": [{"src": "https://cdn.example.com/a.jpg"}, {"src": "https://cdn.example.com/b.jpg"}]
        })));
        assert_eq!(fields.name, "Mug");
        assert_eq!(fields.description.as_deref(), Some("Holds coffee"));
        assert_eq!(fields.price.to_remote_string(), "9");
        assert_eq!(fields.image_url.as_deref(), Some("https://cdn.example.com/a.jpg"));
        assert_eq!(fields.status, MirrorStatus::Published);
    }

    #[test]
    fn test_fields_fall_back_to_current_price() {
        let fields = MirrorFields::from_remote(&remote(json!({
            "id": 6, "name": "Cap", "price": "4.25", "regular_price": "", "status": "pending"
        })));
        assert_eq!(fields.price.to_remote_string(), "4.25");
        assert_eq!(fields.status, MirrorStatus::Draft);
        assert_eq!(fields.description, None);
        assert_eq!(fields.image_url, None);
    }

    #[test]
    fn test_payload_from_mirror_maps_status() {
        let now = Utc::now();
        let mirror = ProductMirror {
            id: MirrorId::new(1),
            user_id: UserId::new(1),
            name: "Lamp".to_owned(),
            description: None,
            price: Price::parse("12.00").unwrap(),
            image_url: Some("https://cdn.example.com/lamp.jpg".to_owned()),
            status: MirrorStatus::Published,
            remote_id: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(
            serde_json::to_value(mirror.to_payload()).unwrap(),
            json!({
                "name": "Lamp",
                "regular_price": "12",
                "status": "publish",
                "images": [{"src": "https://cdn.example.com/lamp.jpg"}]
            })
        );
    }
}
