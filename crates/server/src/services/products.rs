//! Product operations against the remote store, with the local mirror kept as
//! a side effect.
//!
//! The remote call decides the outcome. Mirror writes that fail after a
//! successful remote call are logged and dropped; the caller still sees the
//! remote result.

use thiserror::Error;

use woo_bridge_core::{ProductDraft, RemoteProductId, UserId};

use crate::db::{MirrorStore, RepositoryError};
use crate::models::product::{MirrorFields, NewMirror, ProductMirror};
use crate::woocommerce::{
    ListParams, ProductGateway, ProductPage, ProductPayload, RemoteProduct, WooCommerceError,
};

/// The remote operation a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductOperation {
    List,
    Get,
    Create,
    Update,
    Delete,
    Sync,
}

impl ProductOperation {
    /// Prefix put in front of the underlying error message.
    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::List => "Failed to fetch WooCommerce products",
            Self::Get => "Failed to fetch product",
            Self::Create => "Failed to create product in WooCommerce",
            Self::Update => "Failed to update product in WooCommerce",
            Self::Delete => "Failed to delete product from WooCommerce",
            Self::Sync => "Failed to sync product with WooCommerce",
        }
    }
}

#[derive(Debug, Error)]
pub enum ProductServiceError {
    /// Transport or API failure talking to the store.
    #[error("{}: {source}", .operation.failure_message())]
    Remote {
        operation: ProductOperation,
        #[source]
        source: WooCommerceError,
    },

    /// Local mirror failure on a path where the mirror is required.
    #[error("mirror error: {0}")]
    Mirror(#[from] RepositoryError),
}

impl ProductServiceError {
    fn remote(operation: ProductOperation) -> impl FnOnce(WooCommerceError) -> Self {
        move |source| Self::Remote { operation, source }
    }
}

/// Product operations for one request.
pub struct ProductService<'a> {
    gateway: &'a dyn ProductGateway,
    mirror: &'a dyn MirrorStore,
}

impl<'a> ProductService<'a> {
    #[must_use]
    pub const fn new(gateway: &'a dyn ProductGateway, mirror: &'a dyn MirrorStore) -> Self {
        Self { gateway, mirror }
    }

    /// # Errors
    ///
    /// Returns `ProductServiceError::Remote` if the store call fails.
    pub async fn list(&self, params: &ListParams) -> Result<ProductPage, ProductServiceError> {
        self.gateway
            .list(params)
            .await
            .map_err(ProductServiceError::remote(ProductOperation::List))
    }

    /// # Errors
    ///
    /// Returns `ProductServiceError::Remote` if the store call fails,
    /// including when the product does not exist.
    pub async fn get(&self, id: RemoteProductId) -> Result<RemoteProduct, ProductServiceError> {
        self.gateway
            .get(id)
            .await
            .map_err(ProductServiceError::remote(ProductOperation::Get))
    }

    /// Create a product remotely, then mirror it under `owner`.
    ///
    /// # Errors
    ///
    /// Returns `ProductServiceError::Remote` if the store call fails.
    pub async fn create(
        &self,
        owner: UserId,
        draft: &ProductDraft,
    ) -> Result<RemoteProduct, ProductServiceError> {
        let product = self
            .gateway
            .create(&ProductPayload::for_create(draft))
            .await
            .map_err(ProductServiceError::remote(ProductOperation::Create))?;

        tracing::info!(remote_id = %product.id, user_id = %owner, "Product created in WooCommerce");

        let new_mirror = NewMirror {
            user_id: owner,
            remote_id: product.id,
            fields: MirrorFields::from_remote(&product),
        };
        if let Err(e) = self.mirror.insert(&new_mirror).await {
            tracing::warn!(remote_id = %product.id, error = %e, "Failed to mirror created product");
        }

        Ok(product)
    }

    /// Update a product remotely, then refresh its mirror row if one exists.
    ///
    /// # Errors
    ///
    /// Returns `ProductServiceError::Remote` if the store call fails.
    pub async fn update(
        &self,
        id: RemoteProductId,
        draft: &ProductDraft,
    ) -> Result<RemoteProduct, ProductServiceError> {
        let product = self
            .gateway
            .update(id, &ProductPayload::for_update(draft))
            .await
            .map_err(ProductServiceError::remote(ProductOperation::Update))?;

        match self
            .mirror
            .update_by_remote_id(id, &MirrorFields::from_remote(&product))
            .await
        {
            Ok(Some(_)) => {}
            Ok(None) => tracing::debug!(remote_id = %id, "No mirror row to update"),
            Err(e) => {
                tracing::warn!(remote_id = %id, error = %e, "Failed to mirror updated product");
            }
        }

        Ok(product)
    }

    /// Delete a product remotely (bypassing the trash), then drop its mirror.
    ///
    /// # Errors
    ///
    /// Returns `ProductServiceError::Remote` if the store call fails.
    pub async fn delete(&self, id: RemoteProductId) -> Result<RemoteProduct, ProductServiceError> {
        let product = self
            .gateway
            .delete(id)
            .await
            .map_err(ProductServiceError::remote(ProductOperation::Delete))?;

        if let Err(e) = self.mirror.delete_by_remote_id(id).await {
            tracing::warn!(remote_id = %id, error = %e, "Failed to remove mirrored product");
        }

        Ok(product)
    }

    /// Push a mirror row to the store.
    ///
    /// Rows that already carry a remote id are updated in place. Rows without
    /// one are created remotely and the assigned id is written back.
    ///
    /// # Errors
    ///
    /// Returns `ProductServiceError::Remote` if the store call fails and
    /// `ProductServiceError::Mirror` if the new remote id cannot be stored.
    pub async fn sync_to_remote(
        &self,
        mirror: &ProductMirror,
    ) -> Result<RemoteProduct, ProductServiceError> {
        let payload = mirror.to_payload();

        if let Some(remote_id) = mirror.remote_id {
            return self
                .gateway
                .update(remote_id, &payload)
                .await
                .map_err(ProductServiceError::remote(ProductOperation::Sync));
        }

        let product = self
            .gateway
            .create(&payload)
            .await
            .map_err(ProductServiceError::remote(ProductOperation::Sync))?;

        self.mirror.set_remote_id(mirror.id, product.id).await?;
        tracing::info!(mirror_id = %mirror.id, remote_id = %product.id, "Mirror row pushed");

        Ok(product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_message_is_prefixed() {
        let err = ProductServiceError::Remote {
            operation: ProductOperation::Create,
            source: WooCommerceError::Api {
                status: 400,
                code: Some("woocommerce_rest_invalid".to_owned()),
                message: "Invalid parameter(s): regular_price".to_owned(),
            },
        };
        assert_eq!(
            err.to_string(),
            "Failed to create product in WooCommerce: API error 400: Invalid parameter(s): regular_price"
        );
    }

    #[test]
    fn test_failure_messages() {
        assert_eq!(
            ProductOperation::List.failure_message(),
            "Failed to fetch WooCommerce products"
        );
        assert_eq!(
            ProductOperation::Delete.failure_message(),
            "Failed to delete product from WooCommerce"
        );
    }
}
