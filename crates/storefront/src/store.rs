//! Flat-file persistence for the product list.
//!
//! # File format
//!
//! A single JSON array of [`Product`] records, pretty-printed with two-space
//! indentation. The whole file is rewritten on every save.
//!
//! # Writes
//!
//! Saves go to a sibling `*.tmp` file which is then renamed over the target,
//! so a reader never observes a half-written array. There is no fsync and no
//! cross-process locking.

use std::io;
use std::path::{Path, PathBuf};

use catalog_core::{Product, ProductId};
use thiserror::Error;
use tracing::instrument;

/// Errors raised while reading or writing the product file.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The product file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The product file could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The product file is not a valid product array.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The product list could not be serialized.
    #[error("failed to serialize products: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl StoreError {
    /// Returns `true` if the error means the file does not exist yet.
    #[must_use]
    pub fn is_missing_file(&self) -> bool {
        matches!(self, Self::Read { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

/// State recovered from the product file at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveredCatalog {
    pub products: Vec<Product>,
    /// `None` when the highest stored ID leaves no room for another.
    pub next_id: Option<ProductId>,
}

impl RecoveredCatalog {
    /// An empty catalog whose first product gets ID 1.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            products: Vec::new(),
            next_id: Some(ProductId::FIRST),
        }
    }

    fn from_products(products: Vec<Product>) -> Self {
        let next_id = next_id_after(&products);
        Self { products, next_id }
    }
}

/// The ID to assign after `products`: one past the highest existing ID, or
/// `None` if the highest ID is already the largest representable.
#[must_use]
pub fn next_id_after(products: &[Product]) -> Option<ProductId> {
    products
        .iter()
        .map(|p| p.id)
        .max()
        .map_or(Some(ProductId::FIRST), ProductId::next)
}

/// JSON file backing the product list.
#[derive(Debug, Clone)]
pub struct ProductStore {
    path: PathBuf,
}

impl ProductStore {
    /// Create a store backed by the file at `path`.
    ///
    /// The file is not touched until [`load`](Self::load) or
    /// [`save`](Self::save) is called.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the product file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Read`] if the file cannot be read (including when
    /// it does not exist) and [`StoreError::Parse`] if its content is not a
    /// product array.
    pub async fn load(&self) -> Result<Vec<Product>, StoreError> {
        let data = tokio::fs::read(&self.path)
            .await
            .map_err(|source| StoreError::Read {
                path: self.path.clone(),
                source,
            })?;

        serde_json::from_slice(&data).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Load the product list, falling back to an empty catalog on any failure.
    ///
    /// Failures are logged, never escalated: a missing file is the normal
    /// first-run state, a corrupt one is reported and replaced on the next save.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn recover(&self) -> RecoveredCatalog {
        match self.load().await {
            Ok(products) => {
                let recovered = RecoveredCatalog::from_products(products);
                tracing::info!(
                    products = recovered.products.len(),
                    next_id = ?recovered.next_id,
                    "Product file loaded"
                );
                recovered
            }
            Err(e) if e.is_missing_file() => {
                tracing::info!("Product file not found, starting with an empty catalog");
                RecoveredCatalog::empty()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load product file, starting with an empty catalog");
                RecoveredCatalog::empty()
            }
        }
    }

    /// Serialize `products` and overwrite the backing file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialize`] or [`StoreError::Write`]. The error is
    /// also logged here, so callers only need to decide what to report.
    #[instrument(skip(self, products), fields(path = %self.path.display(), products = products.len()))]
    pub async fn save(&self, products: &[Product]) -> Result<(), StoreError> {
        let result = self.write_all(products).await;
        match &result {
            Ok(()) => tracing::debug!("Product file saved"),
            Err(e) => tracing::error!(error = %e, "Failed to save product file"),
        }
        result
    }

    async fn write_all(&self, products: &[Product]) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(products).map_err(StoreError::Serialize)?;
        let tmp = self.temp_path();

        let write_error = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        tokio::fs::write(&tmp, &data).await.map_err(write_error)?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(write_error)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use catalog_core::{NewProduct, Price};

    use super::*;

    fn product(id: i32, code: &str) -> Product {
        let fields = NewProduct {
            title: Some(format!("Product {id}")),
            description: Some("desc".to_string()),
            price: Some(Price::from_cents(1050)),
            thumbnail: Some("thumb.png".to_string()),
            code: Some(code.to_string()),
            stock: Some(4),
        }
        .validate()
        .unwrap();
        Product::new(ProductId::new(id), fields)
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProductStore::new(dir.path().join("products.json"));
        let products = vec![product(3, "C"), product(1, "A"), product(2, "B")];

        store.save(&products).await.unwrap();
        let loaded = store.load().await.unwrap();

        assert_eq!(loaded, products);
    }

    #[tokio::test]
    async fn test_save_writes_pretty_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.json");
        let store = ProductStore::new(&path);

        store.save(&[product(1, "A")]).await.unwrap();
        let text = std::fs::read_to_string(&path).unwrap();

        assert!(text.starts_with("[\n  {\n    \"id\": 1,"));
        assert!(!dir.path().join("products.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_recover_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProductStore::new(dir.path().join("absent.json"));

        let err = store.load().await.unwrap_err();
        assert!(err.is_missing_file());
        assert_eq!(store.recover().await, RecoveredCatalog::empty());
    }

    #[tokio::test]
    async fn test_recover_corrupt_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = ProductStore::new(&path);

        assert!(matches!(
            store.load().await.unwrap_err(),
            StoreError::Parse { .. }
        ));
        assert_eq!(store.recover().await, RecoveredCatalog::empty());
    }

    #[tokio::test]
    async fn test_recover_sets_next_id_past_highest() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProductStore::new(dir.path().join("products.json"));
        store
            .save(&[product(5, "E"), product(2, "B")])
            .await
            .unwrap();

        let recovered = store.recover().await;

        assert_eq!(recovered.products.len(), 2);
        assert_eq!(recovered.next_id, Some(ProductId::new(6)));
    }

    #[tokio::test]
    async fn test_save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProductStore::new(dir.path().join("nope").join("products.json"));

        let err = store.save(&[product(1, "A")]).await.unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
    }

    #[test]
    fn test_next_id_after_empty_is_first() {
        assert_eq!(next_id_after(&[]), Some(ProductId::FIRST));
    }

    #[test]
    fn test_next_id_after_max_is_exhausted() {
        assert_eq!(next_id_after(&[product(i32::MAX, "Z"), product(1, "A")]), None);
    }
}
