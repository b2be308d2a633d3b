//! Product mirror repository.

use async_trait::async_trait;
use sqlx::PgPool;

use woo_bridge_core::{MirrorId, RemoteProductId};

use super::RepositoryError;
use crate::models::product::{MirrorFields, NewMirror, ProductMirror};

const COLUMNS: &str = "id, user_id, name, description, price, image_url, status, \
                       wc_product_id, created_at, updated_at";

/// Storage for mirror rows.
#[async_trait]
pub trait MirrorStore: Send + Sync {
    /// Insert a row for a freshly created remote product.
    async fn insert(&self, mirror: &NewMirror) -> Result<ProductMirror, RepositoryError>;

    /// Overwrite the mirrored fields of the row holding `remote_id`.
    ///
    /// Returns `None` when no row references that remote product.
    async fn update_by_remote_id(
        &self,
        remote_id: RemoteProductId,
        fields: &MirrorFields,
    ) -> Result<Option<ProductMirror>, RepositoryError>;

    /// Remove the rows holding `remote_id`, returning how many went away.
    async fn delete_by_remote_id(&self, remote_id: RemoteProductId)
    -> Result<u64, RepositoryError>;

    /// Record the remote id assigned to a row on its first push.
    async fn set_remote_id(
        &self,
        id: MirrorId,
        remote_id: RemoteProductId,
    ) -> Result<(), RepositoryError>;

    async fn get(&self, id: MirrorId) -> Result<Option<ProductMirror>, RepositoryError>;

    /// All rows, oldest first.
    async fn list(&self) -> Result<Vec<ProductMirror>, RepositoryError>;
}

/// `PostgreSQL`-backed [`MirrorStore`].
#[derive(Debug, Clone)]
pub struct PgMirrorStore {
    pool: PgPool,
}

impl PgMirrorStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MirrorStore for PgMirrorStore {
    async fn insert(&self, mirror: &NewMirror) -> Result<ProductMirror, RepositoryError> {
        let fields = &mirror.fields;
        sqlx::query_as::<_, ProductMirror>(&format!(
            "INSERT INTO products \
                 (user_id, name, description, price, image_url, status, wc_product_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        ))
        .bind(mirror.user_id)
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(fields.price)
        .bind(&fields.image_url)
        .bind(fields.status)
        .bind(mirror.remote_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "remote product already mirrored"))
    }

    async fn update_by_remote_id(
        &self,
        remote_id: RemoteProductId,
        fields: &MirrorFields,
    ) -> Result<Option<ProductMirror>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductMirror>(&format!(
            "UPDATE products \
             SET name = $2, description = $3, price = $4, image_url = $5, status = $6, \
                 updated_at = NOW() \
             WHERE id = (SELECT id FROM products WHERE wc_product_id = $1 ORDER BY id LIMIT 1) \
             RETURNING {COLUMNS}"
        ))
        .bind(remote_id)
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(fields.price)
        .bind(&fields.image_url)
        .bind(fields.status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn delete_by_remote_id(
        &self,
        remote_id: RemoteProductId,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE wc_product_id = $1")
            .bind(remote_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn set_remote_id(
        &self,
        id: MirrorId,
        remote_id: RemoteProductId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE products SET wc_product_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(remote_id)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "remote product already mirrored"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn get(&self, id: MirrorId) -> Result<Option<ProductMirror>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductMirror>(&format!(
            "SELECT {COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list(&self) -> Result<Vec<ProductMirror>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductMirror>(&format!(
            "SELECT {COLUMNS} FROM products ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
