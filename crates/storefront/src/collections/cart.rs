//! Shopping cart store.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use verdant_core::{Price, ProductId};

use super::{CollectionEntry, Persisted, lenient_price, lenient_string};
use crate::storage::{KeyValueStore, keys};

/// Subtotal above which shipping is free.
const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(5000, 0, 0, false, 0);

/// Flat shipping charge below the threshold (99.99).
const FLAT_SHIPPING: Price = Price::from_cents(9999);

/// One product in the cart.
///
/// Serialized with the storefront's persisted field names
/// (`id`, `title`, `price`, `qty`, `image`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(rename = "id")]
    pub product_id: ProductId,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(rename = "price", default, deserialize_with = "lenient_price")]
    pub unit_price: Price,
    /// Always at least 1 inside a [`CartStore`].
    #[serde(rename = "qty", default = "default_quantity", deserialize_with = "lenient_quantity")]
    pub quantity: u32,
    #[serde(rename = "image", default, deserialize_with = "lenient_string")]
    pub image_ref: String,
}

impl LineItem {
    /// Create a line item.
    #[must_use]
    pub fn new(
        product_id: impl Into<ProductId>,
        title: impl Into<String>,
        unit_price: Price,
        quantity: u32,
        image_ref: impl Into<String>,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            title: title.into(),
            unit_price,
            quantity,
            image_ref: image_ref.into(),
        }
    }

    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

impl CollectionEntry for LineItem {
    fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    fn absorb_duplicate(&mut self, duplicate: Self) {
        self.quantity = self.quantity.saturating_add(duplicate.quantity);
    }

    fn sanitize(&mut self) {
        self.quantity = self.quantity.max(1);
    }
}

const fn default_quantity() -> u32 {
    1
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // floor of a value >= 1.0
fn lenient_quantity<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = <serde_json::Value as serde::Deserialize>::deserialize(deserializer)?;
    let quantity = match &value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 1.0).map(|f| f.floor() as u64)),
        serde_json::Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    Ok(quantity.map_or(1, |q| u32::try_from(q).unwrap_or(u32::MAX)))
}

/// Derived totals for a cart snapshot. Recompute; never store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartSummary {
    pub subtotal: Price,
    pub shipping: Price,
    pub discount: Price,
    pub grand_total: Price,
}

impl CartSummary {
    /// Compute totals for `items`.
    #[must_use]
    pub fn for_items(items: &[LineItem]) -> Self {
        let subtotal: Price = items.iter().map(LineItem::line_total).sum();
        let shipping = if items.is_empty() || subtotal.amount() > FREE_SHIPPING_THRESHOLD {
            Price::ZERO
        } else {
            FLAT_SHIPPING
        };
        let discount = Price::ZERO;
        Self {
            subtotal,
            shipping,
            discount,
            grand_total: subtotal + shipping - discount,
        }
    }
}

/// Process-wide cart.
///
/// Cheaply cloneable; clones share the same collection.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<Persisted<LineItem>>,
}

impl CartStore {
    /// Hydrate the cart from `storage`.
    #[must_use]
    pub fn open(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            inner: Arc::new(Persisted::hydrate(keys::CART, storage)),
        }
    }

    /// Add `item`, merging with an existing line by summing quantities.
    ///
    /// A quantity of 0 is treated as 1, so `add` never decreases a line.
    pub fn add(&self, mut item: LineItem) {
        item.quantity = item.quantity.max(1);
        self.inner.mutate(|items| {
            if let Some(existing) = items.iter_mut().find(|i| i.product_id == item.product_id) {
                existing.quantity = existing.quantity.saturating_add(item.quantity);
                debug!(product_id = %item.product_id, quantity = existing.quantity, "Cart line merged");
            } else {
                debug!(product_id = %item.product_id, quantity = item.quantity, "Cart line added");
                items.push(item);
            }
        });
    }

    /// Remove the line for `product_id`. Absent ids are a no-op.
    pub fn remove(&self, product_id: &ProductId) {
        self.inner
            .mutate(|items| items.retain(|i| &i.product_id != product_id));
    }

    /// Set an explicit quantity.
    ///
    /// Returns `false` without touching anything when `quantity < 1` or the
    /// line does not exist; callers clamp before calling.
    pub fn set_quantity(&self, product_id: &ProductId, quantity: u32) -> bool {
        if quantity < 1 || !self.contains(product_id) {
            return false;
        }
        self.inner.mutate(|items| {
            items
                .iter_mut()
                .find(|i| &i.product_id == product_id)
                .map(|line| line.quantity = quantity)
                .is_some()
        })
    }

    /// Increase a line's quantity by one.
    pub fn increment(&self, product_id: &ProductId) -> bool {
        self.quantity_of(product_id)
            .is_some_and(|q| self.set_quantity(product_id, q.saturating_add(1)))
    }

    /// Decrease a line's quantity by one. At quantity 1 this is a no-op, not a removal.
    pub fn decrement(&self, product_id: &ProductId) -> bool {
        self.quantity_of(product_id)
            .is_some_and(|q| self.set_quantity(product_id, q.saturating_sub(1)))
    }

    /// Remove the line if present, otherwise add `item` with quantity 1.
    ///
    /// Returns true when the item is in the cart afterwards.
    pub fn toggle(&self, mut item: LineItem) -> bool {
        self.inner.mutate(|items| {
            if items.iter().any(|i| i.product_id == item.product_id) {
                items.retain(|i| i.product_id != item.product_id);
                false
            } else {
                item.quantity = 1;
                items.push(item);
                true
            }
        })
    }

    /// Empty the cart.
    pub fn clear(&self) {
        self.inner.mutate(Vec::clear);
        debug!("Cart cleared");
    }

    /// Snapshot of the lines in insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<LineItem> {
        self.inner.read(<[LineItem]>::to_vec)
    }

    /// Whether a line exists for `product_id`.
    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.quantity_of(product_id).is_some()
    }

    /// Quantity of the line for `product_id`.
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> Option<u32> {
        self.inner.read(|items| {
            items
                .iter()
                .find(|i| &i.product_id == product_id)
                .map(|i| i.quantity)
        })
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read(<[LineItem]>::len)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn unit_count(&self) -> u64 {
        self.inner
            .read(|items| items.iter().map(|i| u64::from(i.quantity)).sum())
    }

    /// Σ(unit price × quantity), computed on every call.
    #[must_use]
    pub fn total(&self) -> Price {
        self.inner
            .read(|items| items.iter().map(LineItem::line_total).sum())
    }

    /// Subtotal, shipping and grand total for the current contents.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        self.inner.read(CartSummary::for_items)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn line(id: &str, cents: i64, qty: u32) -> LineItem {
        LineItem::new(id, format!("Product {id}"), Price::from_cents(cents), qty, "img.png")
    }

    fn persisted(storage: &MemoryStore) -> Vec<LineItem> {
        serde_json::from_str(&storage.get(keys::CART).unwrap().unwrap()).unwrap()
    }

    #[test]
    fn test_add_merges_quantities() {
        let cart = CartStore::open(Arc::new(MemoryStore::new()));
        cart.add(line("p1", 1000, 1));
        cart.add(line("p1", 1000, 2));
        let items = cart.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 3);
    }

    #[test]
    fn test_add_zero_quantity_counts_as_one() {
        let cart = CartStore::open(Arc::new(MemoryStore::new()));
        cart.add(line("p1", 1000, 0));
        cart.add(line("p1", 1000, 0));
        assert_eq!(cart.quantity_of(&ProductId::new("p1")), Some(2));
    }

    #[test]
    fn test_set_quantity_below_one_is_noop() {
        let cart = CartStore::open(Arc::new(MemoryStore::new()));
        cart.add(line("p1", 1000, 4));
        assert!(!cart.set_quantity(&ProductId::new("p1"), 0));
        assert_eq!(cart.quantity_of(&ProductId::new("p1")), Some(4));
        assert!(cart.set_quantity(&ProductId::new("p1"), 7));
        assert_eq!(cart.quantity_of(&ProductId::new("p1")), Some(7));
    }

    #[test]
    fn test_set_quantity_missing_line() {
        let cart = CartStore::open(Arc::new(MemoryStore::new()));
        assert!(!cart.set_quantity(&ProductId::new("ghost"), 2));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_decrement_stops_at_one() {
        let cart = CartStore::open(Arc::new(MemoryStore::new()));
        cart.add(line("p1", 1000, 2));
        assert!(cart.decrement(&ProductId::new("p1")));
        assert!(!cart.decrement(&ProductId::new("p1")));
        assert_eq!(cart.quantity_of(&ProductId::new("p1")), Some(1));
        assert!(cart.increment(&ProductId::new("p1")));
        assert_eq!(cart.quantity_of(&ProductId::new("p1")), Some(2));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let cart = CartStore::open(Arc::new(MemoryStore::new()));
        cart.add(line("p1", 1000, 1));
        cart.remove(&ProductId::new("p2"));
        assert_eq!(cart.len(), 1);
        cart.remove(&ProductId::new("p1"));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_persisted_snapshot_matches_memory() {
        let storage = Arc::new(MemoryStore::new());
        let cart = CartStore::open(storage.clone());
        cart.add(line("p1", 1000, 1));
        cart.add(line("p2", 250, 3));
        cart.set_quantity(&ProductId::new("p1"), 5);
        cart.add(line("p3", 99, 1));
        cart.remove(&ProductId::new("p2"));
        cart.set_quantity(&ProductId::new("p3"), 0);
        assert_eq!(persisted(&storage), cart.items());

        let reopened = CartStore::open(storage);
        assert_eq!(reopened.items(), cart.items());
    }

    #[test]
    fn test_insertion_order_preserved() {
        let cart = CartStore::open(Arc::new(MemoryStore::new()));
        for id in ["c", "a", "b"] {
            cart.add(line(id, 100, 1));
        }
        cart.add(line("a", 100, 1));
        let ids: Vec<_> = cart.items().into_iter().map(|i| i.product_id.into_inner()).collect();
        assert_eq!(ids, ["c", "a", "b"]);
    }

    #[test]
    fn test_unavailable_storage_keeps_memory_consistent() {
        let storage = Arc::new(MemoryStore::new());
        let cart = CartStore::open(storage.clone());
        storage.set_unavailable(true);
        cart.add(line("p1", 1000, 2));
        cart.add(line("p1", 1000, 1));
        assert_eq!(cart.quantity_of(&ProductId::new("p1")), Some(3));
        cart.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_total_and_summary() {
        let cart = CartStore::open(Arc::new(MemoryStore::new()));
        assert_eq!(cart.summary().grand_total, Price::ZERO);

        cart.add(line("p1", 1000, 2));
        cart.add(line("p2", 550, 1));
        assert_eq!(cart.total(), Price::from_cents(2550));
        let summary = cart.summary();
        assert_eq!(summary.shipping, Price::from_cents(9999));
        assert_eq!(summary.grand_total, Price::from_cents(12549));

        cart.add(line("big", 600_000, 1));
        assert_eq!(cart.summary().shipping, Price::ZERO);
    }

    #[test]
    fn test_huge_prices_saturate_totals() {
        let cart = CartStore::open(Arc::new(MemoryStore::new()));
        let max = Price::new(Decimal::MAX);
        cart.add(LineItem::new("p1", "Gold", max, 2, ""));
        cart.add(LineItem::new("p2", "Silver", max, u32::MAX, ""));

        assert_eq!(cart.items()[0].line_total(), max);
        assert_eq!(cart.total(), max);
        let summary = cart.summary();
        assert_eq!(summary.shipping, Price::ZERO);
        assert_eq!(summary.grand_total, max);
    }

    #[test]
    fn test_hydrates_legacy_snapshot() {
        let storage = Arc::new(MemoryStore::new());
        storage
            .set(
                keys::CART,
                r#"[
                    {"id":"p1","title":"Tea","price":12.5,"image":"tea.png","qty":2},
                    {"id":"p2","title":"Mug","price":"4.00","image":null},
                    {"id":"p1","title":"Tea","price":12.5,"image":"tea.png","qty":1},
                    {"id":"p3","title":"Free","price":null,"qty":0}
                ]"#,
            )
            .unwrap();
        let cart = CartStore::open(storage);
        let items = cart.items();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].quantity, 3);
        assert_eq!(items[1].quantity, 1);
        assert_eq!(items[1].image_ref, "");
        assert_eq!(items[2].unit_price, Price::ZERO);
        assert_eq!(items[2].quantity, 1);
    }

    #[test]
    fn test_garbage_snapshot_hydrates_empty() {
        let storage = Arc::new(MemoryStore::new());
        storage.set(keys::CART, "{not json").unwrap();
        assert!(CartStore::open(storage).is_empty());
    }

    #[test]
    fn test_toggle() {
        let cart = CartStore::open(Arc::new(MemoryStore::new()));
        assert!(cart.toggle(line("p1", 100, 5)));
        assert_eq!(cart.quantity_of(&ProductId::new("p1")), Some(1));
        assert!(!cart.toggle(line("p1", 100, 1)));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_clones_share_state() {
        let cart = CartStore::open(Arc::new(MemoryStore::new()));
        let other = cart.clone();
        other.add(line("p1", 100, 1));
        assert_eq!(cart.unit_count(), 1);
    }
}
