//! Application state shared across handlers.

use std::sync::Arc;

use crate::catalog::{InMemoryCatalog, ProductCatalog};
use crate::config::StorefrontConfig;
use crate::services::auth::TokenSigner;
use crate::services::cart::CartService;
use crate::store::{CartStore, UserStore};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Every store lives here rather than in a
/// global, so each instance (and each test) is fully isolated.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: Arc<InMemoryCatalog>,
    users: UserStore,
    tokens: TokenSigner,
    carts: CartService,
}

impl AppState {
    /// Create application state with the seeded catalog.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        Self::with_catalog(config, InMemoryCatalog::seeded())
    }

    /// Create application state around a given catalog.
    #[must_use]
    pub fn with_catalog(config: StorefrontConfig, catalog: InMemoryCatalog) -> Self {
        let catalog = Arc::new(catalog);
        let tokens = TokenSigner::new(config.token_secret.clone(), config.token_ttl);
        let carts = CartService::new(
            CartStore::new(config.cart_idle_ttl),
            Arc::clone(&catalog) as Arc<dyn ProductCatalog>,
            config.catalog_timeout,
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                users: UserStore::new(),
                tokens,
                carts,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &InMemoryCatalog {
        &self.inner.catalog
    }

    /// Get a reference to the user store.
    #[must_use]
    pub fn users(&self) -> &UserStore {
        &self.inner.users
    }

    /// Get a reference to the token signer.
    #[must_use]
    pub fn tokens(&self) -> &TokenSigner {
        &self.inner.tokens
    }

    /// Get a reference to the cart service.
    #[must_use]
    pub fn carts(&self) -> &CartService {
        &self.inner.carts
    }
}
