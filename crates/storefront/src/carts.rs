//! In-memory shopping carts.
//!
//! Carts are not persisted and are lost on restart.

use std::collections::HashMap;

use catalog_core::{Cart, CartId, ProductId, ValidationError};
use rand::Rng;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::catalog::ProductManager;

/// Cart IDs are drawn uniformly from `0..CART_ID_SPACE`.
const CART_ID_SPACE: u32 = 1_000_000;

/// Draws attempted before giving up on finding a free cart ID.
const MAX_ID_DRAWS: usize = 64;

/// Errors returned by cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// No cart has this ID.
    #[error("cart not found: {0}")]
    CartNotFound(CartId),

    /// The product to add does not exist.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// The requested quantity is invalid.
    #[error("invalid cart request: {0}")]
    Validation(#[from] ValidationError),

    /// No free cart ID could be found.
    #[error("no cart IDs available ({0} carts live)")]
    IdsExhausted(usize),
}

/// Registry of live carts.
pub struct CartRegistry {
    carts: RwLock<HashMap<CartId, Cart>>,
    id_space: u32,
}

impl Default for CartRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CartRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::with_id_space(CART_ID_SPACE)
    }

    /// Create an empty registry drawing IDs from `0..id_space`.
    #[must_use]
    pub fn with_id_space(id_space: u32) -> Self {
        Self {
            carts: RwLock::new(HashMap::new()),
            id_space,
        }
    }

    /// Create an empty cart with a fresh random ID.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::IdsExhausted`] when every ID is taken, or when
    /// no free one turned up within a bounded number of draws.
    pub async fn create(&self) -> Result<Cart, CartError> {
        let mut carts = self.carts.write().await;

        let live = carts.len();
        let id = if u32::try_from(live).is_ok_and(|n| n < self.id_space) {
            (0..MAX_ID_DRAWS)
                .map(|_| random_cart_id(self.id_space))
                .find(|candidate| !carts.contains_key(candidate))
        } else {
            None
        };

        let Some(id) = id else {
            tracing::error!(carts = live, "No free cart ID");
            return Err(CartError::IdsExhausted(live));
        };

        let cart = Cart::new(id.clone());
        carts.insert(id, cart.clone());
        tracing::info!(cart_id = %cart.id, carts = carts.len(), "Cart created");
        Ok(cart)
    }

    /// The cart with `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::CartNotFound`] if no cart has this ID.
    pub async fn get(&self, id: &CartId) -> Result<Cart, CartError> {
        self.carts
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| CartError::CartNotFound(id.clone()))
    }

    /// Add `quantity` units of `product` to the cart with `id`.
    ///
    /// The product must exist in `catalog`. Repeated additions of the same
    /// product increase the quantity of its existing line.
    ///
    /// # Errors
    ///
    /// - [`CartError::Validation`] if `quantity` is zero
    /// - [`CartError::CartNotFound`] if no cart has this ID
    /// - [`CartError::ProductNotFound`] if the product is not in the catalog
    pub async fn add_product(
        &self,
        id: &CartId,
        product: ProductId,
        quantity: u32,
        catalog: &ProductManager,
    ) -> Result<Cart, CartError> {
        if quantity == 0 {
            return Err(ValidationError::ZeroQuantity.into());
        }

        let mut carts = self.carts.write().await;
        let cart = carts
            .get_mut(id)
            .ok_or_else(|| CartError::CartNotFound(id.clone()))?;

        catalog
            .get(product)
            .await
            .map_err(|_| CartError::ProductNotFound(product))?;

        let total = cart.add_product(product, quantity)?;
        tracing::info!(
            cart_id = %id,
            product_id = %product,
            quantity = total,
            items = cart.item_count(),
            "Cart line updated"
        );
        Ok(cart.clone())
    }
}

fn random_cart_id(id_space: u32) -> CartId {
    CartId::new(rand::rng().random_range(0..id_space).to_string())
}
