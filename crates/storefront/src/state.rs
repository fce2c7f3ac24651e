//! Application state shared across handlers.

use std::sync::Arc;

use crate::broadcast::ChangeBroadcaster;
use crate::carts::CartRegistry;
use crate::catalog::ProductManager;
use crate::config::CatalogConfig;
use crate::store::ProductStore;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. There is exactly one catalog
/// and one cart registry per process; every handler reaches them through
/// this state rather than through globals.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: CatalogConfig,
    catalog: ProductManager,
    carts: CartRegistry,
}

impl AppState {
    /// Create the application state, loading the product file named in
    /// `config`.
    ///
    /// A missing or unreadable product file is logged and yields an empty
    /// catalog; it never prevents startup.
    pub async fn new(config: CatalogConfig) -> Self {
        let store = ProductStore::new(config.products_file.clone());
        let catalog = ProductManager::open(store, ChangeBroadcaster::new()).await;

        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                carts: CartRegistry::new(),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &CatalogConfig {
        &self.inner.config
    }

    /// Get a reference to the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &ProductManager {
        &self.inner.catalog
    }

    /// Get a reference to the cart registry.
    #[must_use]
    pub fn carts(&self) -> &CartRegistry {
        &self.inner.carts
    }

    /// Get a reference to the product list broadcaster.
    #[must_use]
    pub fn broadcaster(&self) -> &ChangeBroadcaster {
        self.inner.catalog.broadcaster()
    }
}
