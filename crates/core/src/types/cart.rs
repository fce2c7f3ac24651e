//! Shopping cart types.

use serde::{Deserialize, Serialize};

use super::id::{CartId, ProductId};
use super::product::ValidationError;

/// One product entry in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: ProductId,
    pub quantity: u32,
}

/// An in-memory shopping cart.
///
/// Holds at most one line per product. Lines keep the order in which their
/// product was first added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub products: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new(id: CartId) -> Self {
        Self {
            id,
            products: Vec::new(),
        }
    }

    /// Add `quantity` units of `product`, merging into an existing line.
    ///
    /// Returns the line's quantity after the addition.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ZeroQuantity`] if `quantity` is zero.
    pub fn add_product(
        &mut self,
        product: ProductId,
        quantity: u32,
    ) -> Result<u32, ValidationError> {
        if quantity == 0 {
            return Err(ValidationError::ZeroQuantity);
        }

        if let Some(line) = self.products.iter_mut().find(|line| line.product == product) {
            line.quantity = line.quantity.saturating_add(quantity);
            return Ok(line.quantity);
        }

        self.products.push(CartLine { product, quantity });
        Ok(quantity)
    }

    /// Quantity of `product` in the cart, if present.
    #[must_use]
    pub fn quantity_of(&self, product: ProductId) -> Option<u32> {
        self.products
            .iter()
            .find(|line| line.product == product)
            .map(|line| line.quantity)
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.products
            .iter()
            .fold(0, |total, line| total.saturating_add(line.quantity))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_adds_merge_into_one_line() {
        let mut cart = Cart::new(CartId::new("1"));
        cart.add_product(ProductId::new(3), 2).unwrap();
        let quantity = cart.add_product(ProductId::new(3), 3).unwrap();

        assert_eq!(quantity, 5);
        assert_eq!(cart.products.len(), 1);
        assert_eq!(cart.quantity_of(ProductId::new(3)), Some(5));
    }

    #[test]
    fn test_lines_keep_first_added_order() {
        let mut cart = Cart::new(CartId::new("1"));
        cart.add_product(ProductId::new(2), 1).unwrap();
        cart.add_product(ProductId::new(1), 1).unwrap();
        cart.add_product(ProductId::new(2), 4).unwrap();

        let order: Vec<_> = cart.products.iter().map(|l| l.product.as_i32()).collect();
        assert_eq!(order, vec![2, 1]);
        assert_eq!(cart.item_count(), 6);
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let mut cart = Cart::new(CartId::new("1"));
        assert_eq!(
            cart.add_product(ProductId::new(1), 0).unwrap_err(),
            ValidationError::ZeroQuantity
        );
        assert!(cart.products.is_empty());
    }

    #[test]
    fn test_cart_json_shape() {
        let mut cart = Cart::new(CartId::new("42"));
        cart.add_product(ProductId::new(7), 1).unwrap();
        let json = serde_json::to_value(&cart).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "42", "products": [{"product": 7, "quantity": 1}]})
        );
    }
}
