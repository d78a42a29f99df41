//! Cart store.
//!
//! Maps each owner to their own `Arc<Mutex<Cart>>`. The map itself is a
//! concurrent cache, so looking up one owner never blocks another, and the
//! per-cart mutex serializes mutations of a single owner's cart.
//!
//! Carts that are not touched for the configured idle period are evicted; the
//! owner's next request starts from an empty cart. A request that mutates a
//! cart hands it back with [`CartStore::reinstate`], so a cart that expires
//! while a request holds it is put back rather than dropped. If another
//! request already started a fresh cart for the owner in that window, the
//! fresh cart wins and the late change is discarded with a warning.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tokio::sync::Mutex;

use zaulimi_core::{Cart, UserId};

/// Shared handle to one owner's cart.
pub type CartHandle = Arc<Mutex<Cart>>;

/// Store holding one cart per owner.
#[derive(Clone)]
pub struct CartStore {
    carts: Cache<UserId, CartHandle>,
}

impl CartStore {
    /// Create an empty store with the given idle expiry.
    #[must_use]
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            carts: Cache::builder().time_to_idle(idle_ttl).build(),
        }
    }

    /// Get the owner's cart, creating an empty one on first access.
    ///
    /// Concurrent first accesses for the same owner all receive the same
    /// handle.
    pub async fn cart(&self, owner: UserId) -> CartHandle {
        self.carts
            .get_with(owner, async move { Arc::new(Mutex::new(Cart::new(owner))) })
            .await
    }

    /// Put `handle` back as the owner's cart if the entry expired while it
    /// was in use. Returns whether the store holds `handle` afterwards.
    pub async fn reinstate(&self, owner: UserId, handle: &CartHandle) -> bool {
        let ours = Arc::clone(handle);
        let entry = self
            .carts
            .entry(owner)
            .or_insert_with(async move { ours })
            .await;

        let kept = Arc::ptr_eq(entry.value(), handle);
        if entry.is_fresh() && kept {
            tracing::debug!(owner = %owner, "Reinstated expired cart");
        } else if !kept {
            tracing::warn!(owner = %owner, "Cart replaced while in use, change discarded");
        }
        kept
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_owner_gets_same_cart() {
        let store = CartStore::new(Duration::from_secs(60));
        let a = store.cart(UserId::new(1)).await;
        let b = store.cart(UserId::new(1)).await;
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_owners_get_distinct_carts() {
        let store = CartStore::new(Duration::from_secs(60));
        let a = store.cart(UserId::new(1)).await;
        let b = store.cart(UserId::new(2)).await;
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(b.lock().await.owner(), UserId::new(2));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_first_access_yields_one_cart() {
        let store = CartStore::new(Duration::from_secs(60));
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.cart(UserId::new(9)).await })
            })
            .collect();

        let mut carts = Vec::new();
        for handle in handles {
            if let Ok(cart) = handle.await {
                carts.push(cart);
            }
        }
        assert_eq!(carts.len(), 16);
        assert!(carts.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[tokio::test]
    async fn test_reinstate_restores_cart_expired_mid_request() {
        let store = CartStore::new(Duration::from_millis(50));
        let handle = store.cart(UserId::new(3)).await;

        tokio::time::sleep(Duration::from_millis(120)).await;
        store.carts.run_pending_tasks().await;
        assert!(store.carts.get(&UserId::new(3)).await.is_none());

        handle
            .lock()
            .await
            .add_item(
                zaulimi_core::ProductId::parse("1").unwrap(),
                2,
                zaulimi_core::ProductSnapshot {
                    name: "Organic Tomatoes".to_string(),
                    unit_price: zaulimi_core::Price::from_cents(5000),
                    image_url: None,
                },
            )
            .unwrap();

        assert!(store.reinstate(UserId::new(3), &handle).await);
        let current = store.cart(UserId::new(3)).await;
        assert!(Arc::ptr_eq(&current, &handle));
        assert_eq!(current.lock().await.total_items(), 2);
    }

    #[tokio::test]
    async fn test_reinstate_keeps_live_cart() {
        let store = CartStore::new(Duration::from_secs(60));
        let handle = store.cart(UserId::new(4)).await;
        assert!(store.reinstate(UserId::new(4), &handle).await);

        let stranger = Arc::new(Mutex::new(Cart::new(UserId::new(4))));
        assert!(!store.reinstate(UserId::new(4), &stranger).await);
        assert!(Arc::ptr_eq(&store.cart(UserId::new(4)).await, &handle));
    }

    #[tokio::test]
    async fn test_locked_cart_does_not_block_other_owners() {
        let store = CartStore::new(Duration::from_secs(60));
        let first = store.cart(UserId::new(1)).await;
        let _held = first.lock().await;

        let other = store.cart(UserId::new(2)).await;
        let guard = tokio::time::timeout(Duration::from_millis(100), other.lock()).await;
        assert!(guard.is_ok());
    }
}
