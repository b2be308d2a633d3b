//! Product create/update input and its validation.
//!
//! The same rules apply to `POST /products` and `PUT /products/{id}`:
//!
//! | field         | rule                                             |
//! |---------------|--------------------------------------------------|
//! | `name`        | required string, at most 255 characters          |
//! | `description` | optional string                                  |
//! | `price`       | required, numeric (number or numeric string), 0 to 99999999.99 |
//! | `image_url`   | optional, absolute URL with a host               |
//! | `status`      | optional, `draft` or `publish` (default `draft`) |
//!
//! String values are trimmed, and blank strings count as absent.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::types::{Price, PriceError, RemoteStatus};
use crate::validation::ValidationErrors;

pub const MAX_NAME_LENGTH: usize = 255;

/// Largest price the mirror's `NUMERIC(10, 2)` column can hold.
#[must_use]
pub fn max_price() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

/// Raw request body. Fields stay untyped so that every broken field can be
/// reported instead of failing on the first type mismatch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductInput {
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub description: Option<Value>,
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default)]
    pub image_url: Option<Value>,
    #[serde(default)]
    pub status: Option<Value>,
}

/// A product request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub image_url: Option<String>,
    pub status: RemoteStatus,
}

/// A field value after trimming, with blank strings and `null` folded into `Missing`.
enum Field {
    Missing,
    Text(String),
    Other,
}

fn field(value: Option<&Value>) -> Field {
    match value {
        None | Some(Value::Null) => Field::Missing,
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Field::Missing
            } else {
                Field::Text(trimmed.to_owned())
            }
        }
        Some(_) => Field::Other,
    }
}

impl ProductInput {
    /// Check every rule and collect all failures.
    ///
    /// # Errors
    ///
    /// Returns the per-field messages if any rule fails.
    pub fn validate(&self) -> Result<ProductDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = match field(self.name.as_ref()) {
            Field::Missing => {
                errors.add("name", "The name field is required.");
                None
            }
            Field::Text(name) if name.chars().count() > MAX_NAME_LENGTH => {
                errors.add(
                    "name",
                    format!("The name field must not be greater than {MAX_NAME_LENGTH} characters."),
                );
                None
            }
            Field::Text(name) => Some(name),
            Field::Other => {
                errors.add("name", "The name field must be a string.");
                None
            }
        };

        let description = match field(self.description.as_ref()) {
            Field::Missing => None,
            Field::Text(text) => Some(text),
            Field::Other => {
                errors.add("description", "The description field must be a string.");
                None
            }
        };

        let price = match self.price.as_ref() {
            None | Some(Value::Null) => {
                errors.add("price", "The price field is required.");
                None
            }
            Some(Value::String(s)) if s.trim().is_empty() => {
                errors.add("price", "The price field is required.");
                None
            }
            Some(value) => match Price::from_json(value) {
                Ok(price) if exceeds_max_price(price) => {
                    errors.add(
                        "price",
                        format!("The price field must not be greater than {}.", max_price()),
                    );
                    None
                }
                Ok(price) => Some(price),
                Err(PriceError::NotNumeric) => {
                    errors.add("price", "The price field must be a number.");
                    None
                }
                Err(PriceError::Negative) => {
                    errors.add("price", "The price field must be at least 0.");
                    None
                }
            },
        };

        let image_url = match field(self.image_url.as_ref()) {
            Field::Missing => None,
            Field::Text(text) if is_well_formed_url(&text) => Some(text),
            Field::Text(_) | Field::Other => {
                errors.add("image_url", "The image url field must be a valid URL.");
                None
            }
        };

        let status = match field(self.status.as_ref()) {
            Field::Missing => RemoteStatus::default(),
            Field::Text(text) => text.parse().unwrap_or_else(|_| {
                errors.add("status", "The selected status is invalid.");
                RemoteStatus::default()
            }),
            Field::Other => {
                errors.add("status", "The selected status is invalid.");
                RemoteStatus::default()
            }
        };

        match (name, price) {
            (Some(name), Some(price)) if errors.is_empty() => Ok(ProductDraft {
                name,
                description,
                price,
                image_url,
                status,
            }),
            _ => Err(errors),
        }
    }
}

/// Compares after rounding to cents, the way the mirror column stores it.
fn exceeds_max_price(price: Price) -> bool {
    price
        .amount()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        > max_price()
}

fn is_well_formed_url(text: &str) -> bool {
    Url::parse(text).is_ok_and(|url| url.has_host())
}
