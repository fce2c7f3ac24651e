//! Catalog product types.
//!
//! - [`Product`] is the persisted record.
//! - [`NewProduct`] is the raw input of an add, where every field may be absent.
//! - [`ProductPatch`] is the whitelist of fields an update may touch.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// Errors raised when product or cart input is incomplete.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was not supplied.
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    /// A text field was supplied but is empty.
    #[error("field must not be empty: {0}")]
    EmptyField(&'static str),
    /// A cart quantity of zero was requested.
    #[error("quantity must be at least 1")]
    ZeroQuantity,
}

/// A catalog product.
///
/// `id` is assigned by the catalog and never changes. `code` is unique
/// across the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub price: Price,
    pub thumbnail: String,
    pub code: String,
    pub stock: u32,
}

impl Product {
    /// Build a product from validated fields and its assigned ID.
    #[must_use]
    pub fn new(id: ProductId, fields: ProductFields) -> Self {
        Self {
            id,
            title: fields.title,
            description: fields.description,
            price: fields.price,
            thumbnail: fields.thumbnail,
            code: fields.code,
            stock: fields.stock,
        }
    }
}

/// Every field of a product except its identity, all present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFields {
    pub title: String,
    pub description: String,
    pub price: Price,
    pub thumbnail: String,
    pub code: String,
    pub stock: u32,
}

/// Product input as received from a client.
///
/// Unknown keys (including `id`) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewProduct {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub thumbnail: Option<String>,
    pub code: Option<String>,
    pub stock: Option<u32>,
}

impl NewProduct {
    /// Check that every field is present and every text field is non-empty.
    ///
    /// A price or stock of zero counts as present.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found, in field declaration order.
    pub fn validate(self) -> Result<ProductFields, ValidationError> {
        Ok(ProductFields {
            title: required_text("title", self.title)?,
            description: required_text("description", self.description)?,
            price: self.price.ok_or(ValidationError::MissingField("price"))?,
            thumbnail: required_text("thumbnail", self.thumbnail)?,
            code: required_text("code", self.code)?,
            stock: self.stock.ok_or(ValidationError::MissingField("stock"))?,
        })
    }
}

/// Partial update of a product.
///
/// Only these fields can change; identity is not part of the patch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub thumbnail: Option<String>,
    pub code: Option<String>,
    pub stock: Option<u32>,
}

impl ProductPatch {
    /// Returns `true` if the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.thumbnail.is_none()
            && self.code.is_none()
            && self.stock.is_none()
    }

    /// Merge the supplied fields over `product`.
    ///
    /// Nothing is written unless every supplied text field is non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyField`] for an empty text field.
    pub fn apply_to(&self, product: &mut Product) -> Result<(), ValidationError> {
        for (name, value) in [
            ("title", &self.title),
            ("description", &self.description),
            ("thumbnail", &self.thumbnail),
            ("code", &self.code),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(ValidationError::EmptyField(name));
            }
        }

        if let Some(title) = &self.title {
            product.title.clone_from(title);
        }
        if let Some(description) = &self.description {
            product.description.clone_from(description);
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(thumbnail) = &self.thumbnail {
            product.thumbnail.clone_from(thumbnail);
        }
        if let Some(code) = &self.code {
            product.code.clone_from(code);
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        Ok(())
    }
}

fn required_text(name: &'static str, value: Option<String>) -> Result<String, ValidationError> {
    match value {
        None => Err(ValidationError::MissingField(name)),
        Some(v) if v.trim().is_empty() => Err(ValidationError::EmptyField(name)),
        Some(v) => Ok(v),
    }
}
