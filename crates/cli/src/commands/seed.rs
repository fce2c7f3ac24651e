//! Seed the product file from YAML.
//!
//! The YAML file is a list of products with the same fields the API
//! accepts:
//!
//! ```yaml
//! - title: Lamp
//!   description: Desk lamp
//!   price: 12.50
//!   thumbnail: lamp.png
//!   code: L1
//!   stock: 4
//! ```
//!
//! Each entry goes through the catalog like any other add, so entries with
//! missing fields or a taken code are reported and skipped.

use std::path::{Path, PathBuf};

use catalog_core::NewProduct;
use catalog_storefront::catalog::{CatalogError, ProductManager};
use thiserror::Error;
use tracing::{info, warn};

/// Errors that stop a seed run.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Outcome of a seed run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub added: usize,
    pub skipped: usize,
}

/// Add every product listed in the YAML file at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if the product
/// file cannot be saved. Rejected entries are skipped, not errors.
pub async fn products(catalog: &ProductManager, path: &Path) -> Result<SeedSummary, SeedError> {
    info!(path = %path.display(), "Loading products from file");

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SeedError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    let entries: Vec<NewProduct> =
        serde_yaml::from_str(&content).map_err(|source| SeedError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    info!(entries = entries.len(), "Parsed seed file");

    let summary = seed(catalog, entries).await?;

    info!("Seeding complete!");
    info!("  Products added: {}", summary.added);
    info!("  Entries skipped: {}", summary.skipped);

    Ok(summary)
}

async fn seed(catalog: &ProductManager, entries: Vec<NewProduct>) -> Result<SeedSummary, SeedError> {
    let mut summary = SeedSummary::default();

    for (index, entry) in entries.into_iter().enumerate() {
        match catalog.add(entry).await {
            Ok(product) => {
                info!(id = %product.id, code = %product.code, "Added");
                summary.added += 1;
            }
            Err(err @ (CatalogError::Validation(_) | CatalogError::DuplicateCode(_))) => {
                warn!(entry = index + 1, error = %err, "Skipped");
                summary.skipped += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(summary)
}
