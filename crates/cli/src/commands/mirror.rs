//! Push local mirror rows to WooCommerce.
//!
//! # Usage
//!
//! ```bash
//! # Push every mirror row
//! woo-bridge mirror push
//!
//! # Push a single row by its local id
//! woo-bridge mirror push --id 12
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `WOOCOMMERCE_URL`, `WOOCOMMERCE_CONSUMER_KEY`, `WOOCOMMERCE_CONSUMER_SECRET`

use secrecy::SecretString;
use thiserror::Error;

use woo_bridge_core::MirrorId;
use woo_bridge_server::config::{ConfigError, WooCommerceConfig};
use woo_bridge_server::db::{self, MirrorStore, PgMirrorStore, RepositoryError};
use woo_bridge_server::services::ProductService;
use woo_bridge_server::woocommerce::{WooCommerceClient, WooCommerceError};

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("WooCommerce client error: {0}")]
    Client(#[from] WooCommerceError),

    #[error("No mirror row with id {0}")]
    NotFound(MirrorId),

    #[error("{failed} of {total} rows failed to push")]
    Partial { failed: usize, total: usize },
}

/// Push one row, or all rows when `id` is `None`.
///
/// Every row is attempted; failures are logged and counted.
///
/// # Errors
///
/// Returns `MirrorError::Partial` if any row failed to push.
pub async fn push(id: Option<i64>) -> Result<(), MirrorError> {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").map_err(|_| MirrorError::MissingEnvVar("DATABASE_URL"))?;
    let woocommerce = WooCommerceConfig::from_env()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&SecretString::from(database_url)).await?;
    let mirror = PgMirrorStore::new(pool);
    let gateway = WooCommerceClient::new(&woocommerce)?;
    let service = ProductService::new(&gateway, &mirror);

    let rows = match id.map(MirrorId::new) {
        Some(id) => vec![mirror.get(id).await?.ok_or(MirrorError::NotFound(id))?],
        None => mirror.list().await?,
    };

    let total = rows.len();
    let mut failed = 0;
    for row in &rows {
        match service.sync_to_remote(row).await {
            Ok(product) => {
                tracing::info!(mirror_id = %row.id, remote_id = %product.id, name = %row.name, "Pushed");
            }
            Err(e) => {
                failed += 1;
                tracing::error!(mirror_id = %row.id, error = %e, "Push failed");
            }
        }
    }

    tracing::info!("Pushed {} of {} rows", total - failed, total);
    if failed > 0 {
        return Err(MirrorError::Partial { failed, total });
    }
    Ok(())
}
