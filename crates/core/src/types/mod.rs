//! Core types for the catalog/cart service.
//!
//! This module provides type-safe wrappers for the domain concepts.

pub mod cart;
pub mod id;
pub mod price;
pub mod product;

pub use cart::{Cart, CartLine};
pub use id::{CartId, ProductId};
pub use price::Price;
pub use product::{NewProduct, Product, ProductFields, ProductPatch, ValidationError};
