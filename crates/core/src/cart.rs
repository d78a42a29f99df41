//! The cart aggregate.
//!
//! A [`Cart`] is a plain value holding one owner's line items. It enforces the
//! cart rules and nothing else:
//!
//! - Line items are unique by product; adding an existing product merges the
//!   quantities instead of appending a second line.
//! - A stored quantity is always at least 1. Setting a quantity to zero or
//!   below removes the line; an absent line is the only representation of
//!   "zero".
//! - Totals are derived from the current lines on every call and never
//!   stored. A mutation whose cart total would not be representable is
//!   rejected, so the totals of a cart built here never overflow.
//!
//! Every mutation validates before it writes, so a failed call leaves the cart
//! exactly as it was. The aggregate has no locking; callers that share a cart
//! between tasks serialize access themselves.

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId, UserId};

/// Errors raised by cart mutations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// Quantity was below 1 where a positive quantity is required.
    #[error("quantity must be a positive integer (got {0})")]
    InvalidQuantity(i64),

    /// The resulting quantity does not fit in a line item.
    #[error("quantity for product {0} is too large")]
    QuantityOverflow(ProductId),

    /// The cart total would exceed the largest representable amount.
    #[error("cart total is too large after adding product {0}")]
    TotalOverflow(ProductId),

    /// Two lines reference the same product.
    #[error("cart contains more than one line for product {0}")]
    DuplicateLine(ProductId),
}

/// Display fields captured from the catalog when a product is first added.
///
/// The snapshot is not refreshed afterwards; a later catalog price change
/// does not reprice lines already in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    pub name: String,
    pub unit_price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// One product-quantity pairing within a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    product_id: ProductId,
    snapshot: ProductSnapshot,
    quantity: u32,
}

impl LineItem {
    #[must_use]
    pub const fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.snapshot.name
    }

    #[must_use]
    pub const fn unit_price(&self) -> Price {
        self.snapshot.unit_price
    }

    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        self.snapshot.image_url.as_deref()
    }

    /// Always at least 1.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// `quantity × unit_price` for this line.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.snapshot.unit_price.saturating_times(self.quantity)
    }
}

/// What [`Cart::set_quantity`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetQuantity {
    /// The line existed and now holds the new quantity.
    Updated,
    /// The line existed and was removed because the quantity was ≤ 0.
    Removed,
    /// There was no line for the product; nothing changed.
    Absent,
}

/// One owner's shopping cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    owner: UserId,
    items: Vec<LineItem>,
}

impl Cart {
    /// Create an empty cart for an owner.
    #[must_use]
    pub const fn new(owner: UserId) -> Self {
        Self {
            owner,
            items: Vec::new(),
        }
    }

    #[must_use]
    pub const fn owner(&self) -> UserId {
        self.owner
    }

    /// Line items in the order they were first added.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Look up the line for a product.
    #[must_use]
    pub fn item(&self, product_id: &ProductId) -> Option<&LineItem> {
        self.items.iter().find(|line| &line.product_id == product_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add `quantity` units of a product.
    ///
    /// Merges into the existing line when the product is already in the cart
    /// (the existing snapshot is kept); otherwise appends a new line built
    /// from `snapshot`. Returns the product's quantity after the change.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] if `quantity` is 0,
    /// [`CartError::QuantityOverflow`] if the merged quantity would overflow,
    /// and [`CartError::TotalOverflow`] if the cart total would.
    pub fn add_item(
        &mut self,
        product_id: ProductId,
        quantity: u32,
        snapshot: ProductSnapshot,
    ) -> Result<u32, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity(0));
        }

        if let Some(line) = self.item(&product_id) {
            let merged = line
                .quantity
                .checked_add(quantity)
                .ok_or_else(|| CartError::QuantityOverflow(product_id.clone()))?;
            self.check_total_with(&product_id, line.unit_price(), merged)?;
            if let Some(line) = self.item_mut(&product_id) {
                line.quantity = merged;
            }
            return Ok(merged);
        }

        self.check_total_with(&product_id, snapshot.unit_price, quantity)?;
        self.items.push(LineItem {
            product_id,
            snapshot,
            quantity,
        });
        Ok(quantity)
    }

    /// Replace the quantity of an existing line.
    ///
    /// A quantity of zero or below removes the line; removing an absent line
    /// is a no-op. A positive quantity for an absent product does not create
    /// a line and reports [`SetQuantity::Absent`].
    ///
    /// # Errors
    ///
    /// Returns [`CartError::QuantityOverflow`] if `quantity` exceeds the
    /// largest storable quantity and [`CartError::TotalOverflow`] if the cart
    /// total would. An absent line is reported as `Absent` whatever the
    /// quantity.
    pub fn set_quantity(
        &mut self,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<SetQuantity, CartError> {
        if quantity <= 0 {
            return Ok(if self.remove_item(product_id) {
                SetQuantity::Removed
            } else {
                SetQuantity::Absent
            });
        }

        let Some(unit_price) = self.item(product_id).map(LineItem::unit_price) else {
            return Ok(SetQuantity::Absent);
        };

        let quantity =
            u32::try_from(quantity).map_err(|_| CartError::QuantityOverflow(product_id.clone()))?;
        self.check_total_with(product_id, unit_price, quantity)?;
        if let Some(line) = self.item_mut(product_id) {
            line.quantity = quantity;
        }
        Ok(SetQuantity::Updated)
    }

    /// Drop the line for a product if present. Returns whether a line was
    /// removed.
    pub fn remove_item(&mut self, product_id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|line| &line.product_id != product_id);
        self.items.len() != before
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|line| u64::from(line.quantity)).sum()
    }

    fn item_mut(&mut self, product_id: &ProductId) -> Option<&mut LineItem> {
        self.items
            .iter_mut()
            .find(|line| &line.product_id == product_id)
    }

    /// Check that the cart total stays representable if `product_id`'s line
    /// held `quantity` units at `unit_price`.
    fn check_total_with(
        &self,
        product_id: &ProductId,
        unit_price: Price,
        quantity: u32,
    ) -> Result<(), CartError> {
        unit_price
            .checked_times(quantity)
            .and_then(|own| {
                self.items
                    .iter()
                    .filter(|line| &line.product_id != product_id)
                    .try_fold(own, |total, line| {
                        total.checked_add(line.unit_price().checked_times(line.quantity)?)
                    })
            })
            .map(|_| ())
            .ok_or_else(|| CartError::TotalOverflow(product_id.clone()))
    }

    /// Sum of `quantity × unit_price` over all lines.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.items.iter().map(LineItem::line_total).sum()
    }

    /// Build the wire representation of this cart.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        CartSummary {
            owner_id: self.owner,
            items: self
                .items
                .iter()
                .map(|line| LineSummary {
                    product_id: line.product_id.clone(),
                    name: line.snapshot.name.clone(),
                    unit_price: line.snapshot.unit_price,
                    quantity: line.quantity,
                    line_total: line.line_total(),
                    image_url: line.snapshot.image_url.clone(),
                })
                .collect(),
            total_items: self.total_items(),
            total_price: self.total_price(),
        }
    }
}

/// One line as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineSummary {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub quantity: u32,
    pub line_total: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// A cart as it appears on the wire, with derived totals filled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub owner_id: UserId,
    pub items: Vec<LineSummary>,
    pub total_items: u64,
    pub total_price: Price,
}

impl From<&Cart> for CartSummary {
    fn from(cart: &Cart) -> Self {
        cart.summary()
    }
}

impl TryFrom<CartSummary> for Cart {
    type Error = CartError;

    /// Rebuild a cart from its wire form.
    ///
    /// The summary's totals are discarded and recomputed from the lines.
    fn try_from(summary: CartSummary) -> Result<Self, Self::Error> {
        let mut cart = Self::new(summary.owner_id);
        for line in summary.items {
            if line.quantity == 0 {
                return Err(CartError::InvalidQuantity(0));
            }
            if cart.item(&line.product_id).is_some() {
                return Err(CartError::DuplicateLine(line.product_id));
            }
            cart.check_total_with(&line.product_id, line.unit_price, line.quantity)?;
            cart.items.push(LineItem {
                product_id: line.product_id,
                snapshot: ProductSnapshot {
                    name: line.name,
                    unit_price: line.unit_price,
                    image_url: line.image_url,
                },
                quantity: line.quantity,
            });
        }
        Ok(cart)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn pid(s: &str) -> ProductId {
        ProductId::parse(s).unwrap()
    }

    fn snapshot(name: &str, cents: u32) -> ProductSnapshot {
        ProductSnapshot {
            name: name.to_string(),
            unit_price: Price::from_cents(cents),
            image_url: None,
        }
    }

    fn recomputed_total(cart: &Cart) -> Decimal {
        cart.items()
            .iter()
            .map(|line| line.unit_price().amount() * Decimal::from(line.quantity()))
            .sum()
    }

    #[test]
    fn test_repeated_adds_merge_into_one_line() {
        let mut cart = Cart::new(UserId::new(1));
        for q in [1, 4, 2, 7] {
            cart.add_item(pid("T1"), q, snapshot("Tomatoes", 5000))
                .unwrap();
        }
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.item(&pid("T1")).unwrap().quantity(), 14);
    }

    #[test]
    fn test_merge_keeps_first_snapshot() {
        let mut cart = Cart::new(UserId::new(1));
        cart.add_item(pid("T1"), 1, snapshot("Tomatoes", 5000))
            .unwrap();
        cart.add_item(pid("T1"), 1, snapshot("Renamed", 9900))
            .unwrap();
        let line = cart.item(&pid("T1")).unwrap();
        assert_eq!(line.name(), "Tomatoes");
        assert_eq!(line.unit_price(), Price::from_cents(5000));
    }

    #[test]
    fn test_add_zero_is_rejected_and_cart_unchanged() {
        let mut cart = Cart::new(UserId::new(1));
        cart.add_item(pid("T1"), 2, snapshot("Tomatoes", 5000))
            .unwrap();
        let before = cart.clone();
        assert_eq!(
            cart.add_item(pid("T1"), 0, snapshot("Tomatoes", 5000)),
            Err(CartError::InvalidQuantity(0))
        );
        assert_eq!(cart, before);
    }

    #[test]
    fn test_add_overflow_is_rejected_and_cart_unchanged() {
        let mut cart = Cart::new(UserId::new(1));
        cart.add_item(pid("T1"), u32::MAX, snapshot("Tomatoes", 5000))
            .unwrap();
        let before = cart.clone();
        assert_eq!(
            cart.add_item(pid("T1"), 1, snapshot("Tomatoes", 5000)),
            Err(CartError::QuantityOverflow(pid("T1")))
        );
        assert_eq!(cart, before);
    }

    #[test]
    fn test_set_quantity_zero_or_negative_removes() {
        let mut cart = Cart::new(UserId::new(1));
        cart.add_item(pid("A"), 3, snapshot("Avocados", 8000))
            .unwrap();
        cart.add_item(pid("C"), 1, snapshot("Carrots", 3000))
            .unwrap();

        assert_eq!(cart.set_quantity(&pid("A"), 0), Ok(SetQuantity::Removed));
        assert!(cart.item(&pid("A")).is_none());
        assert_eq!(cart.set_quantity(&pid("C"), -4), Ok(SetQuantity::Removed));
        assert!(cart.is_empty());

        // Removing again is a no-op.
        assert_eq!(cart.set_quantity(&pid("C"), 0), Ok(SetQuantity::Absent));
    }

    #[test]
    fn test_set_quantity_positive_on_absent_does_not_create() {
        let mut cart = Cart::new(UserId::new(1));
        assert_eq!(cart.set_quantity(&pid("X"), 5), Ok(SetQuantity::Absent));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_replaces() {
        let mut cart = Cart::new(UserId::new(1));
        cart.add_item(pid("A"), 3, snapshot("Avocados", 8000))
            .unwrap();
        assert_eq!(cart.set_quantity(&pid("A"), 10), Ok(SetQuantity::Updated));
        assert_eq!(cart.item(&pid("A")).unwrap().quantity(), 10);
    }

    #[test]
    fn test_set_quantity_too_large() {
        let mut cart = Cart::new(UserId::new(1));
        cart.add_item(pid("A"), 3, snapshot("Avocados", 8000))
            .unwrap();
        let before = cart.clone();
        assert!(matches!(
            cart.set_quantity(&pid("A"), i64::from(u32::MAX) + 1),
            Err(CartError::QuantityOverflow(_))
        ));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_set_quantity_absent_takes_precedence_over_size() {
        let mut cart = Cart::new(UserId::new(1));
        assert_eq!(
            cart.set_quantity(&pid("X"), i64::from(u32::MAX) + 1),
            Ok(SetQuantity::Absent)
        );
        assert!(cart.is_empty());
    }

    fn priced(name: &str, amount: &str) -> ProductSnapshot {
        ProductSnapshot {
            name: name.to_string(),
            unit_price: Price::new(amount.parse().unwrap()).unwrap(),
            image_url: None,
        }
    }

    #[test]
    fn test_add_with_unrepresentable_total_is_rejected_and_cart_unchanged() {
        let mut cart = Cart::new(UserId::new(1));
        cart.add_item(pid("G"), 1, priced("Gold", "100000000000000000000"))
            .unwrap();
        let before = cart.clone();

        assert_eq!(
            cart.add_item(pid("G"), 1_000_000_000, priced("Gold", "100000000000000000000")),
            Err(CartError::TotalOverflow(pid("G")))
        );
        assert_eq!(
            cart.add_item(pid("D"), 1_000_000_000, priced("Diamonds", "100000000000000000000")),
            Err(CartError::TotalOverflow(pid("D")))
        );
        assert_eq!(cart, before);
        assert_eq!(cart.summary().total_price.to_string(), "100000000000000000000.00");
    }

    #[test]
    fn test_set_quantity_with_unrepresentable_total_is_rejected() {
        let mut cart = Cart::new(UserId::new(1));
        cart.add_item(pid("G"), 1, priced("Gold", "100000000000000000000"))
            .unwrap();
        let before = cart.clone();

        assert_eq!(
            cart.set_quantity(&pid("G"), 1_000_000_000),
            Err(CartError::TotalOverflow(pid("G")))
        );
        assert_eq!(cart, before);
    }

    #[test]
    fn test_lines_that_fit_alone_can_overflow_together() {
        let mut cart = Cart::new(UserId::new(1));
        cart.add_item(pid("A"), 500_000_000, priced("A", "100000000000000000000"))
            .unwrap();
        let before = cart.clone();
        assert_eq!(
            cart.add_item(pid("B"), 500_000_000, priced("B", "100000000000000000000")),
            Err(CartError::TotalOverflow(pid("B")))
        );
        assert_eq!(cart, before);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut cart = Cart::new(UserId::new(1));
        cart.add_item(pid("A"), 1, snapshot("Avocados", 8000))
            .unwrap();
        let before = cart.clone();
        assert!(!cart.remove_item(&pid("never-added")));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_insertion_order_is_preserved() {
        let mut cart = Cart::new(UserId::new(1));
        for id in ["3", "1", "2"] {
            cart.add_item(pid(id), 1, snapshot(id, 100)).unwrap();
        }
        cart.add_item(pid("3"), 1, snapshot("3", 100)).unwrap();
        let order: Vec<&str> = cart.items().iter().map(|l| l.product_id().as_str()).collect();
        assert_eq!(order, ["3", "1", "2"]);
    }

    #[test]
    fn test_totals_never_drift() {
        let mut cart = Cart::new(UserId::new(7));
        let products = [("1", 5000), ("2", 3000), ("3", 8000), ("4", 1999)];
        // Deterministic pseudo-random walk over every mutation kind.
        let mut seed: u64 = 0x2545_F491_4F6C_DD1D;
        for _ in 0..500 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let (id, cents) = products[usize::try_from(seed % 4).unwrap()];
            let amount = i64::try_from((seed >> 8) % 6).unwrap() - 1;
            match (seed >> 16) % 4 {
                0 | 1 => {
                    let _ = cart.add_item(
                        pid(id),
                        u32::try_from(amount.max(0)).unwrap(),
                        snapshot(id, cents),
                    );
                }
                2 => {
                    cart.set_quantity(&pid(id), amount).unwrap();
                }
                _ => {
                    cart.remove_item(&pid(id));
                }
            }

            assert_eq!(cart.total_price().amount(), recomputed_total(&cart));
            assert!(cart.items().iter().all(|line| line.quantity() >= 1));
            let mut ids: Vec<&ProductId> = cart.items().iter().map(LineItem::product_id).collect();
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), cart.items().len());
        }
    }

    #[test]
    fn test_tomato_scenario() {
        let mut cart = Cart::new(UserId::new(1));
        assert_eq!(cart.total_price(), Price::zero());

        cart.add_item(pid("T1"), 2, snapshot("Organic Tomatoes", 5000))
            .unwrap();
        assert_eq!(cart.item(&pid("T1")).unwrap().quantity(), 2);
        assert_eq!(cart.total_price().to_string(), "100.00");

        cart.add_item(pid("T1"), 1, snapshot("Organic Tomatoes", 5000))
            .unwrap();
        assert_eq!(cart.item(&pid("T1")).unwrap().quantity(), 3);
        assert_eq!(cart.total_price().to_string(), "150.00");
        assert_eq!(cart.total_items(), 3);

        cart.set_quantity(&pid("T1"), 0).unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total_price().to_string(), "0.00");
    }

    #[test]
    fn test_clear_empties_cart() {
        let mut cart = Cart::new(UserId::new(1));
        cart.add_item(pid("1"), 2, snapshot("a", 100)).unwrap();
        cart.add_item(pid("2"), 2, snapshot("b", 100)).unwrap();
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total_items(), 0);
        assert_eq!(cart.owner(), UserId::new(1));
    }

    #[test]
    fn test_summary_json_shape() {
        let mut cart = Cart::new(UserId::new(5));
        cart.add_item(pid("1"), 2, snapshot("Organic Tomatoes", 5000))
            .unwrap();
        let json = serde_json::to_value(cart.summary()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "ownerId": 5,
                "items": [{
                    "productId": "1",
                    "name": "Organic Tomatoes",
                    "unitPrice": "50.00",
                    "quantity": 2,
                    "lineTotal": "100.00"
                }],
                "totalItems": 2,
                "totalPrice": "100.00"
            })
        );
    }

    #[test]
    fn test_rebuild_from_summary_recomputes_totals() {
        let mut cart = Cart::new(UserId::new(5));
        cart.add_item(pid("1"), 2, snapshot("Organic Tomatoes", 5000))
            .unwrap();
        let mut summary = cart.summary();
        summary.total_price = Price::from_cents(1);
        summary.total_items = 99;

        let rebuilt = Cart::try_from(summary).unwrap();
        assert_eq!(rebuilt, cart);
        assert_eq!(rebuilt.total_price().to_string(), "100.00");
    }

    #[test]
    fn test_rebuild_rejects_broken_invariants() {
        let mut cart = Cart::new(UserId::new(5));
        cart.add_item(pid("1"), 2, snapshot("Organic Tomatoes", 5000))
            .unwrap();

        let mut duplicated = cart.summary();
        let line = duplicated.items[0].clone();
        duplicated.items.push(line);
        assert_eq!(
            Cart::try_from(duplicated),
            Err(CartError::DuplicateLine(pid("1")))
        );

        let mut zeroed = cart.summary();
        zeroed.items[0].quantity = 0;
        assert_eq!(Cart::try_from(zeroed), Err(CartError::InvalidQuantity(0)));

        let mut oversized = cart.summary();
        oversized.items[0].unit_price = Price::new(Decimal::MAX).unwrap();
        assert_eq!(
            Cart::try_from(oversized),
            Err(CartError::TotalOverflow(pid("1")))
        );
    }
}
