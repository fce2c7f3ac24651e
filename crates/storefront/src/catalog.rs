//! Product catalog: the in-memory product list and every mutation of it.
//!
//! All mutations run inside one critical section that checks invariants,
//! persists the resulting list, commits it to memory and broadcasts the new
//! snapshot. A mutation is computed on a copy; if the save fails, memory is
//! left exactly as it was.

use std::sync::Arc;

use catalog_core::{NewProduct, Product, ProductId, ProductPatch, ValidationError};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::instrument;

use crate::broadcast::{ChangeBroadcaster, Snapshot};
use crate::store::{ProductStore, RecoveredCatalog, StoreError};

/// Errors returned by catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Input failed a presence check.
    #[error("invalid product: {0}")]
    Validation(#[from] ValidationError),

    /// Another product already uses this code.
    #[error("product code already exists: {0}")]
    DuplicateCode(String),

    /// No product has this ID.
    #[error("product not found: {0}")]
    NotFound(ProductId),

    /// The product file could not be written.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// No product ID is left to assign.
    #[error("product IDs exhausted")]
    IdsExhausted,
}

struct CatalogState {
    products: Vec<Product>,
    /// `None` once every ID has been handed out.
    next_id: Option<ProductId>,
}

/// The product catalog.
///
/// Owns the product list and ID counter, persists through a
/// [`ProductStore`], and feeds a [`ChangeBroadcaster`].
pub struct ProductManager {
    state: Mutex<CatalogState>,
    store: ProductStore,
    broadcaster: ChangeBroadcaster,
}

impl ProductManager {
    /// Open the catalog, recovering whatever the store holds.
    ///
    /// A missing or unreadable product file yields an empty catalog.
    pub async fn open(store: ProductStore, broadcaster: ChangeBroadcaster) -> Self {
        let recovered = store.recover().await;
        Self::with_state(recovered, store, broadcaster)
    }

    /// Build a catalog from already recovered state.
    #[must_use]
    pub fn with_state(
        recovered: RecoveredCatalog,
        store: ProductStore,
        broadcaster: ChangeBroadcaster,
    ) -> Self {
        Self {
            state: Mutex::new(CatalogState {
                products: recovered.products,
                next_id: recovered.next_id,
            }),
            store,
            broadcaster,
        }
    }

    /// The broadcaster fed by this catalog.
    #[must_use]
    pub const fn broadcaster(&self) -> &ChangeBroadcaster {
        &self.broadcaster
    }

    /// Add a product, assigning it the next ID.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::Validation`] if a field is missing or empty
    /// - [`CatalogError::DuplicateCode`] if the code is taken
    /// - [`CatalogError::IdsExhausted`] if the highest possible ID is taken
    /// - [`CatalogError::Store`] if the product file cannot be saved
    #[instrument(skip(self, input), fields(code = input.code.as_deref()))]
    pub async fn add(&self, input: NewProduct) -> Result<Product, CatalogError> {
        let fields = input.validate().inspect_err(|e| {
            tracing::warn!(error = %e, "Product rejected");
        })?;

        let mut state = self.state.lock().await;

        if state.products.iter().any(|p| p.code == fields.code) {
            tracing::warn!("Product rejected: code already exists");
            return Err(CatalogError::DuplicateCode(fields.code));
        }

        let Some(id) = state.next_id else {
            tracing::error!("Product rejected: no product IDs left");
            return Err(CatalogError::IdsExhausted);
        };

        let product = Product::new(id, fields);
        let mut products = state.products.clone();
        products.push(product.clone());

        self.commit(&mut state, products).await?;
        state.next_id = product.id.next();

        tracing::info!(product_id = %product.id, "Product added");
        Ok(product)
    }

    /// Remove the product with `id`. IDs are never reused.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::NotFound`] if no product has this ID
    /// - [`CatalogError::Store`] if the product file cannot be saved
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete(&self, id: ProductId) -> Result<Product, CatalogError> {
        let mut state = self.state.lock().await;

        let Some(index) = state.products.iter().position(|p| p.id == id) else {
            tracing::warn!("Delete rejected: product not found");
            return Err(CatalogError::NotFound(id));
        };

        let mut products = state.products.clone();
        let removed = products.remove(index);

        self.commit(&mut state, products).await?;

        tracing::info!(code = %removed.code, "Product deleted");
        Ok(removed)
    }

    /// Merge `patch` over the product with `id`.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::NotFound`] if no product has this ID
    /// - [`CatalogError::Validation`] if the patch empties a text field
    /// - [`CatalogError::DuplicateCode`] if the new code belongs to another product
    /// - [`CatalogError::Store`] if the product file cannot be saved
    #[instrument(skip(self, patch), fields(product_id = %id))]
    pub async fn update(&self, id: ProductId, patch: ProductPatch) -> Result<Product, CatalogError> {
        let mut state = self.state.lock().await;

        let Some(index) = state.products.iter().position(|p| p.id == id) else {
            tracing::warn!("Update rejected: product not found");
            return Err(CatalogError::NotFound(id));
        };

        if let Some(code) = &patch.code
            && state.products.iter().any(|p| p.id != id && &p.code == code)
        {
            tracing::warn!(code = %code, "Update rejected: code already exists");
            return Err(CatalogError::DuplicateCode(code.clone()));
        }

        let mut products = state.products.clone();
        let Some(product) = products.get_mut(index) else {
            return Err(CatalogError::NotFound(id));
        };
        patch.apply_to(product).inspect_err(|e| {
            tracing::warn!(error = %e, "Update rejected");
        })?;
        let updated = product.clone();

        self.commit(&mut state, products).await?;

        tracing::info!("Product updated");
        Ok(updated)
    }

    /// The first `limit` products in insertion order, or all of them when
    /// `limit` is `None` or zero.
    pub async fn list(&self, limit: Option<usize>) -> Vec<Product> {
        let state = self.state.lock().await;
        let take = match limit {
            Some(n) if n > 0 => n,
            _ => state.products.len(),
        };
        state.products.iter().take(take).cloned().collect()
    }

    /// The product with `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if no product has this ID.
    pub async fn get(&self, id: ProductId) -> Result<Product, CatalogError> {
        let state = self.state.lock().await;
        state
            .products
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(CatalogError::NotFound(id))
    }

    /// The full product list as a shareable snapshot.
    pub async fn snapshot(&self) -> Snapshot {
        let state = self.state.lock().await;
        Arc::from(state.products.as_slice())
    }

    /// Persist `products`, make them current and broadcast them.
    ///
    /// Runs while the caller holds the state lock, so snapshots reach
    /// observers in mutation order.
    async fn commit(
        &self,
        state: &mut CatalogState,
        products: Vec<Product>,
    ) -> Result<(), CatalogError> {
        self.store.save(&products).await?;
        state.products = products;
        self.broadcaster
            .publish(Arc::from(state.products.as_slice()));
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use catalog_core::Price;
    use tempfile::TempDir;

    use super::*;

    fn input(title: &str, code: &str) -> NewProduct {
        NewProduct {
            title: Some(title.to_string()),
            description: Some(format!("{title} description")),
            price: Some(Price::from_cents(999)),
            thumbnail: Some(format!("/static/img/{code}.png")),
            code: Some(code.to_string()),
            stock: Some(5),
        }
    }

    async fn open_catalog() -> (TempDir, ProductManager) {
        let dir = tempfile::tempdir().unwrap();
        let store = ProductStore::new(dir.path().join("products.json"));
        let catalog = ProductManager::open(store, ChangeBroadcaster::new()).await;
        (dir, catalog)
    }

    fn ids(products: &[Product]) -> Vec<i32> {
        products.iter().map(|p| p.id.as_i32()).collect()
    }

    #[tokio::test]
    async fn test_ids_are_sequential_from_one() {
        let (_dir, catalog) = open_catalog().await;
        for code in ["A", "B", "C", "D"] {
            catalog.add(input(code, code)).await.unwrap();
        }

        assert_eq!(ids(&catalog.list(None).await), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_duplicate_code_rejected_and_list_unchanged() {
        let (_dir, catalog) = open_catalog().await;
        catalog.add(input("A", "X1")).await.unwrap();
        let before = catalog.list(None).await;

        let err = catalog.add(input("Other", "X1")).await.unwrap_err();

        assert!(matches!(err, CatalogError::DuplicateCode(code) if code == "X1"));
        assert_eq!(catalog.list(None).await, before);
    }

    #[tokio::test]
    async fn test_missing_field_rejected() {
        let (_dir, catalog) = open_catalog().await;
        let err = catalog
            .add(NewProduct {
                stock: None,
                ..input("A", "A")
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CatalogError::Validation(ValidationError::MissingField("stock"))
        ));
        assert!(catalog.list(None).await.is_empty());
    }

    #[tokio::test]
    async fn test_zero_price_and_stock_accepted() {
        let (_dir, catalog) = open_catalog().await;
        let product = catalog
            .add(NewProduct {
                price: Some(Price::ZERO),
                stock: Some(0),
                ..input("Free sample", "FREE")
            })
            .await
            .unwrap();

        assert_eq!(product.price, Price::ZERO);
        assert_eq!(product.stock, 0);
    }

    #[tokio::test]
    async fn test_delete_keeps_surviving_ids_and_never_reuses() {
        let (_dir, catalog) = open_catalog().await;
        for code in ["A", "B", "C"] {
            catalog.add(input(code, code)).await.unwrap();
        }

        let removed = catalog.delete(ProductId::new(3)).await.unwrap();
        assert_eq!(removed.code, "C");
        assert_eq!(ids(&catalog.list(None).await), vec![1, 2]);

        let next = catalog.add(input("D", "D")).await.unwrap();
        assert_eq!(next.id, ProductId::new(4));
    }

    #[tokio::test]
    async fn test_delete_unknown_id() {
        let (_dir, catalog) = open_catalog().await;
        let err = catalog.delete(ProductId::new(9)).await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(id) if id == ProductId::new(9)));
    }

    #[tokio::test]
    async fn test_update_unknown_id_leaves_file_untouched() {
        let (dir, catalog) = open_catalog().await;
        catalog.add(input("A", "A")).await.unwrap();
        let path = dir.path().join("products.json");
        let before = std::fs::read(&path).unwrap();

        let patch = ProductPatch {
            stock: Some(1),
            ..ProductPatch::default()
        };
        let err = catalog.update(ProductId::new(42), patch).await.unwrap_err();

        assert!(matches!(err, CatalogError::NotFound(_)));
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn test_update_merges_fields_and_keeps_id() {
        let (_dir, catalog) = open_catalog().await;
        catalog.add(input("A", "A")).await.unwrap();
        let patch: ProductPatch =
            serde_json::from_str(r#"{"id": 77, "price": 12.5, "title": "A2"}"#).unwrap();

        let updated = catalog.update(ProductId::new(1), patch).await.unwrap();

        assert_eq!(updated.id, ProductId::new(1));
        assert_eq!(updated.title, "A2");
        assert_eq!(updated.price, Price::from_cents(1250));
        assert_eq!(catalog.get(ProductId::new(1)).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_update_to_taken_code_rejected() {
        let (_dir, catalog) = open_catalog().await;
        catalog.add(input("A", "A")).await.unwrap();
        catalog.add(input("B", "B")).await.unwrap();

        let patch = ProductPatch {
            code: Some("A".to_string()),
            ..ProductPatch::default()
        };
        let err = catalog.update(ProductId::new(2), patch).await.unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateCode(_)));

        let same = ProductPatch {
            code: Some("B".to_string()),
            ..ProductPatch::default()
        };
        assert!(catalog.update(ProductId::new(2), same).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_limit() {
        let (_dir, catalog) = open_catalog().await;
        for code in ["A", "B", "C"] {
            catalog.add(input(code, code)).await.unwrap();
        }

        assert_eq!(ids(&catalog.list(Some(2)).await), vec![1, 2]);
        assert_eq!(catalog.list(Some(0)).await.len(), 3);
        assert_eq!(catalog.list(Some(10)).await.len(), 3);
    }

    #[tokio::test]
    async fn test_reopen_continues_id_sequence() {
        let (dir, catalog) = open_catalog().await;
        catalog.add(input("A", "A")).await.unwrap();
        catalog.add(input("B", "B")).await.unwrap();
        catalog.delete(ProductId::new(1)).await.unwrap();
        drop(catalog);

        let store = ProductStore::new(dir.path().join("products.json"));
        let reopened = ProductManager::open(store, ChangeBroadcaster::new()).await;
        let product = reopened.add(input("C", "C")).await.unwrap();

        assert_eq!(product.id, ProductId::new(3));
    }

    #[tokio::test]
    async fn test_add_after_highest_id_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.json");
        let store = ProductStore::new(&path);
        let near_max = Product::new(
            ProductId::new(i32::MAX - 1),
            input("A", "A").validate().unwrap(),
        );
        store.save(&[near_max]).await.unwrap();
        let catalog = ProductManager::open(store, ChangeBroadcaster::new()).await;

        let last = catalog.add(input("B", "B")).await.unwrap();
        assert_eq!(last.id, ProductId::new(i32::MAX));
        let before = std::fs::read(&path).unwrap();

        let err = catalog.add(input("C", "C")).await.unwrap_err();

        assert!(matches!(err, CatalogError::IdsExhausted));
        assert_eq!(ids(&catalog.list(None).await), vec![i32::MAX - 1, i32::MAX]);
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn test_failed_save_leaves_memory_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProductStore::new(dir.path().join("missing-dir").join("products.json"));
        let catalog = ProductManager::open(store, ChangeBroadcaster::new()).await;

        let err = catalog.add(input("A", "A")).await.unwrap_err();

        assert!(matches!(err, CatalogError::Store(_)));
        assert!(catalog.list(None).await.is_empty());
    }

    #[tokio::test]
    async fn test_mutations_broadcast_snapshots() {
        let (_dir, catalog) = open_catalog().await;
        let mut observer = catalog.broadcaster().subscribe();

        catalog.add(input("A", "A")).await.unwrap();
        assert_eq!(observer.recv().await.unwrap().len(), 1);

        catalog.delete(ProductId::new(1)).await.unwrap();
        assert!(observer.recv().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_mutation_does_not_broadcast() {
        let (_dir, catalog) = open_catalog().await;
        let mut observer = catalog.broadcaster().subscribe();

        assert!(catalog.delete(ProductId::new(1)).await.is_err());
        catalog.add(input("A", "A")).await.unwrap();

        // The first snapshot seen is the one from the successful add.
        assert_eq!(observer.recv().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_adds_with_same_code_admit_one() {
        let (_dir, catalog) = open_catalog().await;
        let catalog = Arc::new(catalog);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let catalog = Arc::clone(&catalog);
                tokio::spawn(async move { catalog.add(input(&format!("T{i}"), "SAME")).await })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(catalog.list(None).await.len(), 1);
    }

    #[tokio::test]
    async fn test_scenario_from_empty() {
        let (_dir, catalog) = open_catalog().await;

        catalog.add(input("A", "X1")).await.unwrap();
        let listed = catalog.list(None).await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, ProductId::new(1));

        assert!(catalog.add(input("A again", "X1")).await.is_err());
        assert_eq!(catalog.list(None).await.len(), 1);

        catalog.delete(ProductId::new(1)).await.unwrap();
        assert!(catalog.list(None).await.is_empty());

        let next = catalog.add(input("B", "Y2")).await.unwrap();
        assert_eq!(next.id, ProductId::new(2));
    }
}
