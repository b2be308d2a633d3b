//! Product commands against a running woo-bridge server.
//!
//! # Usage
//!
//! ```bash
//! woo-bridge products list --search mug --per-page 10
//! woo-bridge products get 42
//! woo-bridge products create -n Widget -p 9.99 --status publish
//! woo-bridge products update 42 -n "Widget v2" -p 12
//! woo-bridge products delete 42
//! ```

use crate::client::{ApiClient, ClientError, Product, ProductQuery, ProductRequest};

/// Print a page of products, one per line.
///
/// # Errors
///
/// Returns the API error if the listing fails.
pub async fn list(client: &ApiClient, query: &ProductQuery) -> Result<(), ClientError> {
    let response = client.get_products(query).await?;

    #[allow(clippy::print_stdout)]
    {
        for product in &response.products {
            println!("{}", summary_line(product));
        }
        if let Some(pagination) = response.pagination {
            println!(
                "-- {} products, {} pages",
                pagination.total.map_or_else(|| "?".to_owned(), |t| t.to_string()),
                pagination
                    .total_pages
                    .map_or_else(|| "?".to_owned(), |t| t.to_string()),
            );
        }
    }
    tracing::info!("{}", response.message);
    Ok(())
}

/// Print one product as JSON.
///
/// # Errors
///
/// Returns the API error if the product cannot be fetched.
pub async fn get(client: &ApiClient, id: i64) -> Result<(), ClientError> {
    let response = client.get_product(id).await?;
    print_product(&response.product);
    Ok(())
}

/// # Errors
///
/// Returns the API error, including per-field validation failures.
pub async fn create(client: &ApiClient, request: &ProductRequest) -> Result<(), ClientError> {
    let response = client.create_product(request).await?;
    tracing::info!("{}", response.message);
    print_product(&response.product);
    Ok(())
}

/// # Errors
///
/// Returns the API error, including per-field validation failures.
pub async fn update(
    client: &ApiClient,
    id: i64,
    request: &ProductRequest,
) -> Result<(), ClientError> {
    let response = client.update_product(id, request).await?;
    tracing::info!("{}", response.message);
    print_product(&response.product);
    Ok(())
}

/// # Errors
///
/// Returns the API error if the delete fails.
pub async fn delete(client: &ApiClient, id: i64) -> Result<(), ClientError> {
    let response = client.delete_product(id).await?;
    tracing::info!("{}", response.message);
    Ok(())
}

fn summary_line(product: &Product) -> String {
    format!(
        "#{:<6} {:<8} {:>10}  {}",
        product.id, product.status, product.regular_price, product.name
    )
}

fn print_product(product: &Product) {
    let text = serde_json::to_string_pretty(product).unwrap_or_else(|_| summary_line(product));

    #[allow(clippy::print_stdout)]
    {
        println!("{text}");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_line() {
        let product: Product = serde_json::from_value(serde_json::json!({
            "id": 42, "name": "Mug", "regular_price": "9.99", "status": "publish"
        }))
        .unwrap();
        assert_eq!(summary_line(&product), "#42     publish        9.99  Mug");
    }
}
