//! Product management commands.

use catalog_core::{NewProduct, Product, ProductId, ProductPatch};
use catalog_storefront::catalog::{CatalogError, ProductManager};
use tracing::info;

/// Log the first `limit` products, or all of them.
pub async fn list(catalog: &ProductManager, limit: Option<usize>) {
    let products = catalog.list(limit).await;
    if products.is_empty() {
        info!("No products");
        return;
    }

    for product in &products {
        log_product(product);
    }
    info!(shown = products.len(), "Listed products");
}

/// Add a product.
///
/// # Errors
///
/// Returns the catalog's rejection (missing field, duplicate code, save
/// failure).
pub async fn add(catalog: &ProductManager, input: NewProduct) -> Result<Product, CatalogError> {
    let product = catalog.add(input).await?;
    info!(id = %product.id, code = %product.code, "Product added");
    Ok(product)
}

/// Apply `patch` to product `id`.
///
/// # Errors
///
/// Returns an error if the product does not exist, the patch is invalid or
/// the file cannot be saved.
pub async fn update(
    catalog: &ProductManager,
    id: ProductId,
    patch: ProductPatch,
) -> Result<Product, CatalogError> {
    if patch.is_empty() {
        info!(%id, "Nothing to update");
        return catalog.get(id).await;
    }

    let product = catalog.update(id, patch).await?;
    log_product(&product);
    Ok(product)
}

/// Delete product `id`.
///
/// # Errors
///
/// Returns an error if the product does not exist or the file cannot be
/// saved.
pub async fn delete(catalog: &ProductManager, id: ProductId) -> Result<Product, CatalogError> {
    let product = catalog.delete(id).await?;
    info!(%id, code = %product.code, "Product deleted");
    Ok(product)
}

fn log_product(product: &Product) {
    info!(
        id = %product.id,
        code = %product.code,
        price = %product.price.display(),
        stock = product.stock,
        "{}",
        product.title
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use catalog_core::Price;

    use super::*;
    use crate::commands::open_catalog;

    fn lamp(code: &str) -> NewProduct {
        NewProduct {
            title: Some("Lamp".to_string()),
            description: Some("Desk lamp".to_string()),
            price: Some(Price::from_cents(1250)),
            thumbnail: Some("lamp.png".to_string()),
            code: Some(code.to_string()),
            stock: Some(4),
        }
    }

    #[tokio::test]
    async fn test_add_update_delete_persist() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("products.json");

        let catalog = open_catalog(file.clone()).await;
        let added = add(&catalog, lamp("L1")).await.unwrap();
        let patch = ProductPatch {
            stock: Some(10),
            ..ProductPatch::default()
        };
        update(&catalog, added.id, patch).await.unwrap();

        let reopened = open_catalog(file.clone()).await;
        assert_eq!(reopened.get(added.id).await.unwrap().stock, 10);

        delete(&reopened, added.id).await.unwrap();
        assert!(open_catalog(file).await.list(None).await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_update_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = open_catalog(dir.path().join("products.json")).await;
        let added = add(&catalog, lamp("L1")).await.unwrap();

        let unchanged = update(&catalog, added.id, ProductPatch::default())
            .await
            .unwrap();
        assert_eq!(unchanged, added);
    }

    #[tokio::test]
    async fn test_delete_unknown_id_fails() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = open_catalog(dir.path().join("products.json")).await;

        let err = delete(&catalog, ProductId::new(3)).await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
    }
}
