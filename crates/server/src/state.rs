//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::db::{MirrorStore, PgMirrorStore, PgUserStore, UserStore};
use crate::services::auth::AuthService;
use crate::services::products::ProductService;
use crate::woocommerce::{ProductGateway, WooCommerceClient, WooCommerceError};

/// Application state shared across all handlers.
///
/// Cheaply cloneable. The remote store and both local stores sit behind trait
/// objects so the router can run against in-memory implementations.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    gateway: Arc<dyn ProductGateway>,
    mirror: Arc<dyn MirrorStore>,
    users: Arc<dyn UserStore>,
}

impl AppState {
    /// Assemble state from already-built components.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn ProductGateway>,
        mirror: Arc<dyn MirrorStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                gateway,
                mirror,
                users,
            }),
        }
    }

    /// Production state: the WooCommerce client plus `PostgreSQL` stores.
    ///
    /// # Errors
    ///
    /// Returns an error if the WooCommerce client cannot be built.
    pub fn from_config(config: &ServerConfig, pool: PgPool) -> Result<Self, WooCommerceError> {
        let gateway = WooCommerceClient::new(&config.woocommerce)?;

        Ok(Self::new(
            Arc::new(gateway),
            Arc::new(PgMirrorStore::new(pool.clone())),
            Arc::new(PgUserStore::new(pool)),
        ))
    }

    #[must_use]
    pub fn gateway(&self) -> &dyn ProductGateway {
        self.inner.gateway.as_ref()
    }

    #[must_use]
    pub fn mirror(&self) -> &dyn MirrorStore {
        self.inner.mirror.as_ref()
    }

    #[must_use]
    pub fn users(&self) -> &dyn UserStore {
        self.inner.users.as_ref()
    }

    /// Product operations backed by this state's gateway and mirror.
    #[must_use]
    pub fn products(&self) -> ProductService<'_> {
        ProductService::new(self.gateway(), self.mirror())
    }

    /// Authentication backed by this state's user store.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self.users())
    }
}
