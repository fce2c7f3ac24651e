//! CLI command implementations.

pub mod products;
pub mod seed;

use std::path::PathBuf;

use catalog_storefront::broadcast::ChangeBroadcaster;
use catalog_storefront::catalog::ProductManager;
use catalog_storefront::store::ProductStore;

/// Open the catalog backed by `file`. Nobody observes changes made here.
pub async fn open_catalog(file: PathBuf) -> ProductManager {
    tracing::debug!(file = %file.display(), "Opening product file");
    ProductManager::open(ProductStore::new(file), ChangeBroadcaster::new()).await
}
