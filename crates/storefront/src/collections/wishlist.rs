//! Wishlist store with presence-toggle semantics.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;
use verdant_core::{Price, ProductId};

use super::{CartStore, CollectionEntry, LineItem, Persisted, lenient_price, lenient_string};
use crate::storage::{KeyValueStore, keys};

/// A saved product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishEntry {
    #[serde(rename = "id")]
    pub product_id: ProductId,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: Price,
    #[serde(rename = "image", default, deserialize_with = "lenient_string")]
    pub image_ref: String,
}

impl WishEntry {
    /// Create a wishlist entry.
    #[must_use]
    pub fn new(
        product_id: impl Into<ProductId>,
        title: impl Into<String>,
        price: Price,
        image_ref: impl Into<String>,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            title: title.into(),
            price,
            image_ref: image_ref.into(),
        }
    }

    /// A single-unit cart line for this entry.
    #[must_use]
    pub fn to_line_item(&self) -> LineItem {
        LineItem::new(
            self.product_id.clone(),
            self.title.clone(),
            self.price,
            1,
            self.image_ref.clone(),
        )
    }
}

impl CollectionEntry for WishEntry {
    fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    fn absorb_duplicate(&mut self, _duplicate: Self) {}
}

/// Outcome of a wishlist toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WishlistToggle {
    Added,
    Removed,
}

/// Process-wide wishlist.
#[derive(Clone)]
pub struct WishlistStore {
    inner: Arc<Persisted<WishEntry>>,
}

impl WishlistStore {
    /// Hydrate the wishlist from `storage`.
    #[must_use]
    pub fn open(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            inner: Arc::new(Persisted::hydrate(keys::WISHLIST, storage)),
        }
    }

    /// Add `entry`, or remove it if it is already saved.
    pub fn add(&self, entry: WishEntry) -> WishlistToggle {
        self.toggle(entry)
    }

    /// Flip the presence of `entry`.
    pub fn toggle(&self, entry: WishEntry) -> WishlistToggle {
        self.inner.mutate(|entries| {
            let before = entries.len();
            entries.retain(|e| e.product_id != entry.product_id);
            if entries.len() == before {
                debug!(product_id = %entry.product_id, "Wishlist entry added");
                entries.push(entry);
                WishlistToggle::Added
            } else {
                debug!(product_id = %entry.product_id, "Wishlist entry removed");
                WishlistToggle::Removed
            }
        })
    }

    /// Remove `product_id`. Absent ids are a no-op.
    pub fn remove(&self, product_id: &ProductId) {
        self.inner
            .mutate(|entries| entries.retain(|e| &e.product_id != product_id));
    }

    /// Empty the wishlist.
    pub fn clear(&self) {
        self.inner.mutate(Vec::clear);
    }

    /// Toggle the saved product's presence in `cart`.
    ///
    /// Returns `None` when `product_id` is not on the wishlist, otherwise
    /// whether the product is in the cart afterwards.
    pub fn move_to_cart(&self, product_id: &ProductId, cart: &CartStore) -> Option<bool> {
        let entry = self.get(product_id)?;
        Some(cart.toggle(entry.to_line_item()))
    }

    /// Look up a saved entry.
    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<WishEntry> {
        self.inner.read(|entries| {
            entries
                .iter()
                .find(|e| &e.product_id == product_id)
                .cloned()
        })
    }

    /// Whether `product_id` is saved.
    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.get(product_id).is_some()
    }

    /// Snapshot of saved entries in insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<WishEntry> {
        self.inner.read(<[WishEntry]>::to_vec)
    }

    /// Number of saved entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read(<[WishEntry]>::len)
    }

    /// Whether nothing is saved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
