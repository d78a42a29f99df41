//! Product catalog.
//!
//! The cart only needs one thing from the catalog: resolving a product id to
//! its current name, price, and stock. That contract is the
//! [`ProductCatalog`] trait, so the cart service can be tested against slow or
//! failing catalogs. [`InMemoryCatalog`] is the production implementation and
//! also backs the seller CRUD routes.

mod memory;

pub use memory::InMemoryCatalog;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use zaulimi_core::{Price, ProductId, ProductSnapshot};

/// Highest unit price a listing may carry, in kwacha.
const MAX_PRICE_KWACHA: i64 = 1_000_000_000;

/// Errors returned by catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No product with this id.
    #[error("product not found: {0}")]
    NotFound(ProductId),

    /// A product draft failed validation.
    #[error("invalid product: {0}")]
    Invalid(String),

    /// The catalog could not answer.
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

/// A product listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    /// Units available for sale.
    pub stock: u32,
    pub category: String,
    /// Selling unit, e.g. `kg` or `piece`.
    pub unit: String,
    pub organic: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Product {
    /// Capture the fields a cart line keeps.
    #[must_use]
    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            name: self.name.clone(),
            unit_price: self.price,
            image_url: self.image_url.clone(),
        }
    }
}

/// Seller-supplied fields for creating or replacing a product.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    pub stock: u32,
    pub category: String,
    pub unit: String,
    #[serde(default)]
    pub organic: bool,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl ProductDraft {
    /// Check the draft and trim its text fields.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Invalid`] naming the first missing field, or
    /// if the price is above the listing limit.
    pub fn validate(mut self) -> Result<Self, CatalogError> {
        for (field, value) in [
            ("name", &mut self.name),
            ("category", &mut self.category),
            ("unit", &mut self.unit),
        ] {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Err(CatalogError::Invalid(format!("{field} is required")));
            }
            *value = trimmed.to_owned();
        }
        if self.price.amount() > Decimal::from(MAX_PRICE_KWACHA) {
            return Err(CatalogError::Invalid(format!(
                "price must not exceed {MAX_PRICE_KWACHA}.00"
            )));
        }
        self.description = self.description.trim().to_owned();
        self.image_url = self
            .image_url
            .map(|url| url.trim().to_owned())
            .filter(|url| !url.is_empty());
        Ok(self)
    }

    fn into_product(self, id: ProductId) -> Product {
        Product {
            id,
            name: self.name,
            description: self.description,
            price: self.price,
            stock: self.stock,
            category: self.category,
            unit: self.unit,
            organic: self.organic,
            image_url: self.image_url,
        }
    }
}

/// Read-only product lookup used by the cart.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Resolve a product by id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if the id is unknown and
    /// [`CatalogError::Unavailable`] if the catalog cannot answer.
    async fn resolve(&self, id: &ProductId) -> Result<Product, CatalogError>;
}
