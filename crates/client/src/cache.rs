//! Client-side cart cache.
//!
//! The server's cart is authoritative. The cache applies each change to its
//! local copy straight away so a UI can redraw without waiting, then sends
//! the change and replaces the local copy with the cart the server returns.
//!
//! When the server rejects a change or cannot be reached, the local copy is
//! restored and re-fetched. If that re-fetch fails too, the cache keeps the
//! restored copy and reports itself stale until the next successful sync.

use std::future::Future;

use tracing::warn;

use zaulimi_core::{Cart, CartError, CartSummary, ProductId};

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::types::Product;

/// Local copy of the signed-in user's cart.
#[derive(Debug)]
pub struct CartCache {
    api: ApiClient,
    cart: Cart,
    stale: bool,
}

impl CartCache {
    /// Fetch the current cart and start caching it.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be fetched.
    pub async fn load(api: ApiClient) -> Result<Self, ClientError> {
        let cart = Cart::try_from(api.get_cart().await?)?;
        Ok(Self {
            api,
            cart,
            stale: false,
        })
    }

    /// The cached cart.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// The cached cart with totals, as the server would render it.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        self.cart.summary()
    }

    /// Whether the last rollback could not be confirmed with the server.
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        self.stale
    }

    /// Replace the cached cart with the server's.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be fetched; the cache is then
    /// marked stale.
    pub async fn refresh(&mut self) -> Result<&Cart, ClientError> {
        match self.fetch().await {
            Ok(cart) => {
                self.cart = cart;
                self.stale = false;
                Ok(&self.cart)
            }
            Err(e) => {
                self.stale = true;
                Err(e)
            }
        }
    }

    /// Add `quantity` of `product`, merging with any existing line.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Cart` if `quantity` is 0, or the server's error.
    /// The cache is rolled back either way.
    pub async fn add_item(&mut self, product: &Product, quantity: u32) -> Result<&Cart, ClientError> {
        let api = self.api.clone();
        let id = product.id.clone();
        let snapshot = product.snapshot();
        self.commit(
            |cart| cart.add_item(product.id.clone(), quantity, snapshot).map(|_| ()),
            async move { api.add_item(id.as_str(), i64::from(quantity)).await },
        )
        .await
    }

    /// Set a line's quantity; zero or below removes it.
    ///
    /// # Errors
    ///
    /// Returns the server's error, e.g. 404 when the line is absent and
    /// `quantity` is positive. The cache is rolled back.
    pub async fn update_item(
        &mut self,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<&Cart, ClientError> {
        let api = self.api.clone();
        let id = product_id.clone();
        self.commit(
            |cart| cart.set_quantity(product_id, quantity).map(|_| ()),
            async move { api.update_item(id.as_str(), quantity).await },
        )
        .await
    }

    /// Remove a line. Removing an absent line succeeds.
    ///
    /// # Errors
    ///
    /// Returns the server's error; the cache is rolled back.
    pub async fn remove_item(&mut self, product_id: &ProductId) -> Result<&Cart, ClientError> {
        let api = self.api.clone();
        let id = product_id.clone();
        self.commit(
            |cart| {
                cart.remove_item(product_id);
                Ok(())
            },
            async move { api.remove_item(id.as_str()).await },
        )
        .await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns the server's error; the cache is rolled back.
    pub async fn clear(&mut self) -> Result<&Cart, ClientError> {
        let api = self.api.clone();
        self.commit(
            |cart| {
                cart.clear();
                Ok(())
            },
            async move { api.clear_cart().await },
        )
        .await
    }

    /// Apply `local` at once, then settle on the result of `remote`.
    async fn commit<F, R>(&mut self, local: F, remote: R) -> Result<&Cart, ClientError>
    where
        F: FnOnce(&mut Cart) -> Result<(), CartError>,
        R: Future<Output = Result<CartSummary, ClientError>>,
    {
        let snapshot = self.cart.clone();
        if let Err(e) = local(&mut self.cart) {
            self.cart = snapshot;
            return Err(e.into());
        }

        let confirmed = match remote.await {
            Ok(summary) => Cart::try_from(summary).map_err(ClientError::from),
            Err(e) => Err(e),
        };

        match confirmed {
            Ok(cart) => {
                self.cart = cart;
                self.stale = false;
                Ok(&self.cart)
            }
            Err(e) => {
                warn!(error = %e, "Cart change rejected, rolling back");
                self.cart = snapshot;
                match self.fetch().await {
                    Ok(cart) => {
                        self.cart = cart;
                        self.stale = false;
                    }
                    Err(refetch) => {
                        warn!(error = %refetch, "Cart re-fetch failed, cache is stale");
                        self.stale = true;
                    }
                }
                Err(e)
            }
        }
    }

    async fn fetch(&self) -> Result<Cart, ClientError> {
        Ok(Cart::try_from(self.api.get_cart().await?)?)
    }
}
