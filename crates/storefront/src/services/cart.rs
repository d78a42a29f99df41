//! Cart service.
//!
//! Validates requests, resolves products against the catalog, and applies
//! the change to the owner's cart while holding that cart's lock. The catalog
//! is consulted before the lock is taken, so a slow lookup never holds up
//! other requests for the same cart.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::instrument;

use zaulimi_core::{CartError, CartSummary, ProductId, SetQuantity, UserId};

use crate::catalog::{CatalogError, Product, ProductCatalog};
use crate::store::CartStore;

/// Errors returned by cart operations.
#[derive(Debug, Error)]
pub enum CartServiceError {
    /// Malformed request.
    #[error("{0}")]
    Validation(String),

    /// The product id does not resolve in the catalog.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// The cart has no line for the product.
    #[error("item not found in cart: {0}")]
    ItemNotFound(ProductId),

    /// The catalog failed or timed out. Retryable.
    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(String),
}

impl From<CartError> for CartServiceError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::InvalidQuantity(_) => {
                Self::Validation("Quantity must be a positive integer".to_string())
            }
            CartError::QuantityOverflow(_) => Self::Validation("Quantity is too large".to_string()),
            CartError::TotalOverflow(_) => Self::Validation("Cart total is too large".to_string()),
            CartError::DuplicateLine(id) => {
                Self::Validation(format!("Duplicate line for product {id}"))
            }
        }
    }
}

/// Cart operations for authenticated owners.
pub struct CartService {
    store: CartStore,
    catalog: Arc<dyn ProductCatalog>,
    catalog_timeout: Duration,
}

impl CartService {
    /// Create a cart service.
    #[must_use]
    pub fn new(
        store: CartStore,
        catalog: Arc<dyn ProductCatalog>,
        catalog_timeout: Duration,
    ) -> Self {
        Self {
            store,
            catalog,
            catalog_timeout,
        }
    }

    /// The owner's current cart. An owner with no cart gets an empty one.
    pub async fn get_cart(&self, owner: UserId) -> CartSummary {
        let cart = self.store.cart(owner).await;
        let cart = cart.lock().await;
        cart.summary()
    }

    /// Add `quantity` units of a product, merging with any existing line.
    ///
    /// # Errors
    ///
    /// Returns `CartServiceError::Validation` for a blank product id, a
    /// quantity below 1, a total beyond the product's stock, or a cart total
    /// too large to represent;
    /// `CartServiceError::ProductNotFound` if the product does not resolve;
    /// `CartServiceError::CatalogUnavailable` if the lookup fails or times out.
    #[instrument(skip(self), fields(owner = %owner))]
    pub async fn add_item(
        &self,
        owner: UserId,
        product_id: &str,
        quantity: i64,
    ) -> Result<CartSummary, CartServiceError> {
        let product_id = parse_product_id(product_id)?;
        if quantity < 1 {
            return Err(CartError::InvalidQuantity(quantity).into());
        }
        let quantity =
            u32::try_from(quantity).map_err(|_| CartError::QuantityOverflow(product_id.clone()))?;

        let product = self.resolve(&product_id).await?;

        let handle = self.store.cart(owner).await;
        let mut cart = handle.lock().await;

        let in_cart = cart.item(&product_id).map_or(0, |line| line.quantity());
        check_stock(&product, u64::from(in_cart) + u64::from(quantity))?;

        let total = cart.add_item(product_id.clone(), quantity, product.snapshot())?;
        tracing::info!(product_id = %product_id, quantity = total, "Item added to cart");
        self.store.reinstate(owner, &handle).await;

        Ok(cart.summary())
    }

    /// Set a line's quantity. Zero or below removes the line.
    ///
    /// A positive quantity is checked against the product's current stock,
    /// so the product is resolved first, like [`CartService::add_item`].
    ///
    /// # Errors
    ///
    /// Returns `CartServiceError::ItemNotFound` if the cart has no line for the
    /// product and `quantity` is positive; `CartServiceError::Validation` for
    /// a blank product id, a quantity beyond stock, or an oversized quantity
    /// or total; `CartServiceError::ProductNotFound` if the product has left
    /// the catalog; `CartServiceError::CatalogUnavailable` if the lookup fails.
    #[instrument(skip(self), fields(owner = %owner))]
    pub async fn update_item(
        &self,
        owner: UserId,
        product_id: &str,
        quantity: i64,
    ) -> Result<CartSummary, CartServiceError> {
        let product_id = parse_product_id(product_id)?;
        let product = if quantity > 0 {
            Some(self.resolve(&product_id).await?)
        } else {
            None
        };

        let handle = self.store.cart(owner).await;
        let mut cart = handle.lock().await;

        if let Some(product) = product {
            if cart.item(&product_id).is_none() {
                return Err(CartServiceError::ItemNotFound(product_id));
            }
            check_stock(&product, u64::try_from(quantity).unwrap_or(u64::MAX))?;
        }

        match cart.set_quantity(&product_id, quantity)? {
            SetQuantity::Absent if quantity > 0 => {
                return Err(CartServiceError::ItemNotFound(product_id));
            }
            SetQuantity::Removed => {
                tracing::info!(product_id = %product_id, "Item removed from cart");
            }
            SetQuantity::Updated => {
                tracing::info!(product_id = %product_id, quantity, "Cart item updated");
            }
            SetQuantity::Absent => {}
        }
        self.store.reinstate(owner, &handle).await;

        Ok(cart.summary())
    }

    /// Remove a product's line. Removing an absent line is a no-op.
    #[instrument(skip(self), fields(owner = %owner))]
    pub async fn remove_item(&self, owner: UserId, product_id: &str) -> CartSummary {
        let handle = self.store.cart(owner).await;
        let mut cart = handle.lock().await;

        // An id that doesn't parse can't be in the cart.
        if let Ok(product_id) = ProductId::parse(product_id) {
            if cart.remove_item(&product_id) {
                tracing::info!(product_id = %product_id, "Item removed from cart");
                self.store.reinstate(owner, &handle).await;
            }
        }

        cart.summary()
    }

    /// Empty the owner's cart.
    #[instrument(skip(self), fields(owner = %owner))]
    pub async fn clear_cart(&self, owner: UserId) -> CartSummary {
        let handle = self.store.cart(owner).await;
        let mut cart = handle.lock().await;
        cart.clear();
        tracing::info!("Cart cleared");
        self.store.reinstate(owner, &handle).await;
        cart.summary()
    }

    async fn resolve(&self, product_id: &ProductId) -> Result<Product, CartServiceError> {
        match tokio::time::timeout(self.catalog_timeout, self.catalog.resolve(product_id)).await {
            Ok(Ok(product)) => Ok(product),
            Ok(Err(CatalogError::NotFound(id))) => Err(CartServiceError::ProductNotFound(id)),
            Ok(Err(e)) => Err(CartServiceError::CatalogUnavailable(e.to_string())),
            Err(_) => {
                tracing::warn!(
                    product_id = %product_id,
                    timeout = ?self.catalog_timeout,
                    "Catalog lookup timed out"
                );
                Err(CartServiceError::CatalogUnavailable(format!(
                    "catalog lookup timed out after {}ms",
                    self.catalog_timeout.as_millis()
                )))
            }
        }
    }
}

/// Reject a line quantity beyond the product's stock.
fn check_stock(product: &Product, requested: u64) -> Result<(), CartServiceError> {
    if requested > u64::from(product.stock) {
        return Err(CartServiceError::Validation(format!(
            "Only {} {} of {} available",
            product.stock, product.unit, product.name
        )));
    }
    Ok(())
}

fn parse_product_id(raw: &str) -> Result<ProductId, CartServiceError> {
    ProductId::parse(raw).map_err(|e| CartServiceError::Validation(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use async_trait::async_trait;

    use zaulimi_core::Price;

    use super::*;
    use crate::catalog::InMemoryCatalog;

    fn service() -> CartService {
        CartService::new(
            CartStore::new(Duration::from_secs(3600)),
            Arc::new(InMemoryCatalog::seeded()),
            Duration::from_secs(2),
        )
    }

    const OWNER: UserId = UserId::new(1);

    #[tokio::test]
    async fn test_tomato_scenario() {
        let carts = service();

        let cart = carts.add_item(OWNER, "1", 2).await.unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 2);
        assert_eq!(cart.total_price.to_string(), "100.00");

        let cart = carts.add_item(OWNER, "1", 1).await.unwrap();
        assert_eq!(cart.items[0].quantity, 3);
        assert_eq!(cart.total_price.to_string(), "150.00");

        let cart = carts.update_item(OWNER, "1", 0).await.unwrap();
        assert!(cart.items.is_empty());
        assert_eq!(cart.total_price.to_string(), "0.00");
        assert_eq!(cart.total_items, 0);
    }

    #[tokio::test]
    async fn test_unknown_product_leaves_cart_unchanged() {
        let carts = service();
        carts.add_item(OWNER, "2", 1).await.unwrap();

        let err = carts.add_item(OWNER, "UNKNOWN", 1).await.unwrap_err();
        assert!(matches!(err, CartServiceError::ProductNotFound(_)));

        let cart = carts.get_cart(OWNER).await;
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.total_price.to_string(), "30.00");
    }

    #[tokio::test]
    async fn test_add_rejects_bad_input() {
        let carts = service();
        for (id, qty) in [("1", 0), ("1", -3), ("", 1), ("   ", 1)] {
            assert!(
                matches!(
                    carts.add_item(OWNER, id, qty).await,
                    Err(CartServiceError::Validation(_))
                ),
                "({id:?}, {qty}) should be rejected"
            );
        }
        assert!(carts.get_cart(OWNER).await.items.is_empty());
    }

    #[tokio::test]
    async fn test_add_beyond_stock_is_rejected() {
        let carts = service();
        // Avocados: 50 in stock.
        carts.add_item(OWNER, "3", 40).await.unwrap();
        let err = carts.add_item(OWNER, "3", 11).await.unwrap_err();
        assert!(matches!(err, CartServiceError::Validation(msg) if msg.contains("50")));
        assert_eq!(carts.get_cart(OWNER).await.items[0].quantity, 40);

        carts.add_item(OWNER, "3", 10).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_absent_item() {
        let carts = service();
        let err = carts.update_item(OWNER, "1", 4).await.unwrap_err();
        assert!(matches!(err, CartServiceError::ItemNotFound(id) if id.as_str() == "1"));

        // Setting an absent line to zero is a no-op, not an error.
        assert!(carts.update_item(OWNER, "1", 0).await.unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn test_update_absent_item_with_huge_quantity_is_not_found() {
        let carts = service();
        let err = carts
            .update_item(OWNER, "1", i64::from(u32::MAX) + 1)
            .await
            .unwrap_err();
        assert!(matches!(err, CartServiceError::ItemNotFound(_)));
    }

    #[tokio::test]
    async fn test_update_beyond_stock_is_rejected() {
        let carts = service();
        // Avocados: 50 in stock.
        carts.add_item(OWNER, "3", 5).await.unwrap();

        let err = carts.update_item(OWNER, "3", 10_000).await.unwrap_err();
        assert!(matches!(err, CartServiceError::Validation(msg) if msg.contains("50")));
        assert_eq!(carts.get_cart(OWNER).await.items[0].quantity, 5);

        assert_eq!(carts.update_item(OWNER, "3", 50).await.unwrap().total_items, 50);
    }

    #[tokio::test]
    async fn test_update_of_delisted_product_can_still_remove() {
        let catalog = Arc::new(InMemoryCatalog::seeded());
        let carts = CartService::new(
            CartStore::new(Duration::from_secs(3600)),
            Arc::clone(&catalog) as Arc<dyn ProductCatalog>,
            Duration::from_secs(2),
        );
        carts.add_item(OWNER, "2", 3).await.unwrap();
        catalog.delete(&ProductId::parse("2").unwrap()).await.unwrap();

        let err = carts.update_item(OWNER, "2", 4).await.unwrap_err();
        assert!(matches!(err, CartServiceError::ProductNotFound(_)));
        assert_eq!(carts.get_cart(OWNER).await.total_items, 3);

        assert!(carts.update_item(OWNER, "2", 0).await.unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn test_unrepresentable_total_is_rejected_and_cart_stays_usable() {
        let bullion = Product {
            id: ProductId::parse("1").unwrap(),
            name: "Bullion".to_string(),
            description: String::new(),
            price: Price::new("100000000000000000000".parse().unwrap()).unwrap(),
            stock: u32::MAX,
            category: "Metals".to_string(),
            unit: "bar".to_string(),
            organic: false,
            image_url: None,
        };
        let carts = CartService::new(
            CartStore::new(Duration::from_secs(3600)),
            Arc::new(InMemoryCatalog::new(vec![bullion])),
            Duration::from_secs(2),
        );

        let err = carts.add_item(OWNER, "1", 1_000_000_000).await.unwrap_err();
        assert!(matches!(err, CartServiceError::Validation(msg) if msg == "Cart total is too large"));
        assert!(carts.get_cart(OWNER).await.items.is_empty());

        carts.add_item(OWNER, "1", 1).await.unwrap();
        let err = carts.update_item(OWNER, "1", 1_000_000_000).await.unwrap_err();
        assert!(matches!(err, CartServiceError::Validation(_)));
        assert_eq!(carts.get_cart(OWNER).await.total_items, 1);

        assert!(carts.remove_item(OWNER, "1").await.items.is_empty());
        assert!(carts.clear_cart(OWNER).await.items.is_empty());
    }

    #[tokio::test]
    async fn test_update_replaces_quantity() {
        let carts = service();
        carts.add_item(OWNER, "2", 5).await.unwrap();
        let cart = carts.update_item(OWNER, "2", 2).await.unwrap();
        assert_eq!(cart.items[0].quantity, 2);
        assert_eq!(cart.total_price.to_string(), "60.00");
    }

    #[tokio::test]
    async fn test_remove_and_clear_are_idempotent() {
        let carts = service();
        carts.add_item(OWNER, "1", 1).await.unwrap();
        carts.add_item(OWNER, "2", 1).await.unwrap();

        assert_eq!(carts.remove_item(OWNER, "1").await.items.len(), 1);
        assert_eq!(carts.remove_item(OWNER, "1").await.items.len(), 1);
        assert_eq!(carts.remove_item(OWNER, "").await.items.len(), 1);

        assert!(carts.clear_cart(OWNER).await.items.is_empty());
        assert!(carts.clear_cart(OWNER).await.items.is_empty());
    }

    #[tokio::test]
    async fn test_owners_are_isolated() {
        let carts = service();
        carts.add_item(UserId::new(1), "1", 1).await.unwrap();
        carts.add_item(UserId::new(2), "2", 3).await.unwrap();

        let first = carts.get_cart(UserId::new(1)).await;
        let second = carts.get_cart(UserId::new(2)).await;
        assert_eq!(first.owner_id, UserId::new(1));
        assert_eq!(first.total_items, 1);
        assert_eq!(second.total_items, 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_are_not_lost() {
        let carts = Arc::new(service());

        let tasks: Vec<_> = (0..2)
            .map(|_| {
                let carts = Arc::clone(&carts);
                tokio::spawn(async move { carts.add_item(OWNER, "1", 1).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(carts.get_cart(OWNER).await.items[0].quantity, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_many_concurrent_adds_sum_exactly() {
        let carts = Arc::new(service());

        let tasks: Vec<_> = (1..=10)
            .map(|n| {
                let carts = Arc::clone(&carts);
                tokio::spawn(async move { carts.add_item(OWNER, "2", n).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let cart = carts.get_cart(OWNER).await;
        assert_eq!(cart.items[0].quantity, 55);
        assert_eq!(cart.total_price.to_string(), "1650.00");
    }

    struct SlowCatalog(Duration);

    #[async_trait]
    impl ProductCatalog for SlowCatalog {
        async fn resolve(&self, id: &ProductId) -> Result<Product, CatalogError> {
            tokio::time::sleep(self.0).await;
            InMemoryCatalog::seeded().get(id).await
        }
    }

    #[tokio::test]
    async fn test_slow_catalog_times_out_without_touching_cart() {
        let carts = CartService::new(
            CartStore::new(Duration::from_secs(3600)),
            Arc::new(SlowCatalog(Duration::from_millis(500))),
            Duration::from_millis(20),
        );

        let err = carts.add_item(OWNER, "1", 1).await.unwrap_err();
        assert!(matches!(err, CartServiceError::CatalogUnavailable(_)));
        assert!(carts.get_cart(OWNER).await.items.is_empty());
    }

    #[tokio::test]
    async fn test_slow_lookup_does_not_block_same_owner() {
        let carts = Arc::new(CartService::new(
            CartStore::new(Duration::from_secs(3600)),
            Arc::new(SlowCatalog(Duration::from_millis(300))),
            Duration::from_secs(2),
        ));

        let slow = {
            let carts = Arc::clone(&carts);
            tokio::spawn(async move { carts.add_item(OWNER, "1", 1).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Reads proceed while the add is still waiting on the catalog.
        let read = tokio::time::timeout(Duration::from_millis(100), carts.get_cart(OWNER)).await;
        assert!(read.is_ok());

        slow.await.unwrap().unwrap();
        assert_eq!(carts.get_cart(OWNER).await.total_items, 1);
    }
}
