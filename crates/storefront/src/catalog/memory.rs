//! In-memory product catalog.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::instrument;

use zaulimi_core::{Price, ProductId};

use super::{CatalogError, Product, ProductCatalog, ProductDraft};

/// Product catalog held in process memory.
///
/// Products keep their insertion order. New products get sequential numeric
/// ids (as strings) continuing after the highest seeded id.
pub struct InMemoryCatalog {
    inner: RwLock<CatalogInner>,
}

struct CatalogInner {
    products: Vec<Product>,
    next_id: u64,
}

impl InMemoryCatalog {
    /// Create a catalog holding the given products.
    #[must_use]
    pub fn new(products: Vec<Product>) -> Self {
        let next_id = products
            .iter()
            .filter_map(|p| p.id.as_str().parse::<u64>().ok())
            .max()
            .map_or(1, |max| max + 1);

        Self {
            inner: RwLock::new(CatalogInner { products, next_id }),
        }
    }

    /// Create a catalog with the launch listings.
    #[must_use]
    pub fn seeded() -> Self {
        Self::new(seed_products())
    }

    /// All products in listing order.
    pub async fn list(&self) -> Vec<Product> {
        self.inner.read().await.products.clone()
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if the id is unknown.
    pub async fn get(&self, id: &ProductId) -> Result<Product, CatalogError> {
        self.inner
            .read()
            .await
            .products
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(id.clone()))
    }

    /// Add a new product.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Invalid`] if the draft fails validation.
    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn create(&self, draft: ProductDraft) -> Result<Product, CatalogError> {
        let draft = draft.validate()?;

        let mut inner = self.inner.write().await;
        let id = ProductId::parse(&inner.next_id.to_string())
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;
        inner.next_id += 1;

        let product = draft.into_product(id);
        inner.products.push(product.clone());
        tracing::info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    /// Replace a product's fields, keeping its id.
    ///
    /// Carts that already hold the product keep their snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Invalid`] if the draft fails validation and
    /// [`CatalogError::NotFound`] if the id is unknown.
    #[instrument(skip(self, draft), fields(product_id = %id))]
    pub async fn update(&self, id: &ProductId, draft: ProductDraft) -> Result<Product, CatalogError> {
        let draft = draft.validate()?;

        let mut inner = self.inner.write().await;
        let slot = inner
            .products
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| CatalogError::NotFound(id.clone()))?;
        *slot = draft.into_product(id.clone());
        Ok(slot.clone())
    }

    /// Remove a product.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if the id is unknown.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete(&self, id: &ProductId) -> Result<(), CatalogError> {
        let mut inner = self.inner.write().await;
        let before = inner.products.len();
        inner.products.retain(|p| &p.id != id);
        if inner.products.len() == before {
            return Err(CatalogError::NotFound(id.clone()));
        }
        tracing::info!("Product deleted");
        Ok(())
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::seeded()
    }
}

#[async_trait]
impl ProductCatalog for InMemoryCatalog {
    async fn resolve(&self, id: &ProductId) -> Result<Product, CatalogError> {
        self.get(id).await
    }
}

/// The three listings the store launched with.
fn seed_products() -> Vec<Product> {
    let product = |id: &str,
                   name: &str,
                   description: &str,
                   cents: u32,
                   stock: u32,
                   category: &str,
                   unit: &str,
                   organic: bool,
                   image: &str| Product {
        id: ProductId::parse(id).unwrap_or_else(|_| unreachable!("seed ids are non-empty")),
        name: name.to_owned(),
        description: description.to_owned(),
        price: Price::from_cents(cents),
        stock,
        category: category.to_owned(),
        unit: unit.to_owned(),
        organic,
        image_url: Some(format!("https://example.com/{image}.jpg")),
    };

    vec![
        product(
            "1",
            "Organic Tomatoes",
            "Fresh organic tomatoes from local farm",
            5000,
            100,
            "Vegetables",
            "kg",
            true,
            "tomatoes",
        ),
        product(
            "2",
            "Fresh Carrots",
            "Crunchy fresh carrots",
            3000,
            150,
            "Vegetables",
            "kg",
            false,
            "carrots",
        ),
        product(
            "3",
            "Avocados",
            "Ripe avocados",
            8000,
            50,
            "Fruits",
            "piece",
            false,
            "avocados",
        ),
    ]
}
