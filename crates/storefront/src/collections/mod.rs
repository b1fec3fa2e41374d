//! Durably persisted client-side collections (cart and wishlist).
//!
//! # Persistence
//!
//! Every mutation re-serializes the full collection and writes it through to
//! the [`KeyValueStore`] before returning. Writes are best-effort: a failing
//! medium is logged and otherwise ignored, so in-memory state stays
//! consistent regardless of persistence success.
//!
//! Collections preserve insertion order and hold at most one entry per
//! product id.

mod cart;
mod wishlist;

pub use cart::{CartStore, CartSummary, LineItem};
pub use wishlist::{WishEntry, WishlistStore, WishlistToggle};

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use verdant_core::{Price, ProductId};

use crate::storage::KeyValueStore;

/// An entry that can live in a [`Persisted`] collection.
pub(crate) trait CollectionEntry: Clone + Serialize + DeserializeOwned {
    /// Identity of the entry within its collection.
    fn product_id(&self) -> &ProductId;

    /// Fold a duplicate found while hydrating into `self`.
    fn absorb_duplicate(&mut self, duplicate: Self);

    /// Restore entry invariants after loading from storage.
    fn sanitize(&mut self) {}
}

/// Insertion-ordered, write-through collection shared by the cart and wishlist.
pub(crate) struct Persisted<E> {
    key: &'static str,
    storage: Arc<dyn KeyValueStore>,
    entries: Mutex<Vec<E>>,
}

impl<E: CollectionEntry> Persisted<E> {
    /// Hydrate the collection stored under `key`.
    ///
    /// Missing, unreadable or unparseable snapshots hydrate as empty.
    pub(crate) fn hydrate(key: &'static str, storage: Arc<dyn KeyValueStore>) -> Self {
        let loaded: Vec<E> = match storage.get(key) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(key, error = %e, "Discarding unparseable collection snapshot");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(key, error = %e, "Failed to read collection snapshot; starting empty");
                Vec::new()
            }
        };

        let mut entries: Vec<E> = Vec::with_capacity(loaded.len());
        for mut entry in loaded {
            entry.sanitize();
            if let Some(existing) = entries
                .iter_mut()
                .find(|e| e.product_id() == entry.product_id())
            {
                existing.absorb_duplicate(entry);
            } else {
                entries.push(entry);
            }
        }
        debug!(key, count = entries.len(), "Collection hydrated");

        Self {
            key,
            storage,
            entries: Mutex::new(entries),
        }
    }

    /// Run `f` against the current entries.
    pub(crate) fn read<R>(&self, f: impl FnOnce(&[E]) -> R) -> R {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        f(&entries)
    }

    /// Apply `f` and write the resulting snapshot through to storage.
    ///
    /// The lock is held across the write so snapshots reach the medium in
    /// call order.
    pub(crate) fn mutate<R>(&self, f: impl FnOnce(&mut Vec<E>) -> R) -> R {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let result = f(&mut entries);
        self.persist(&entries);
        result
    }

    fn persist(&self, entries: &[E]) {
        let outcome = serde_json::to_string(entries)
            .map_err(crate::storage::StorageError::from)
            .and_then(|json| self.storage.set(self.key, &json));
        if let Err(e) = outcome {
            warn!(key = self.key, error = %e, "Collection persistence failed; keeping in-memory state");
        }
    }
}

// =============================================================================
// Lenient field decoding
// =============================================================================

/// Decode a price that may be a number, a numeric string, null or missing.
pub(crate) fn lenient_price<'de, D>(deserializer: D) -> Result<Price, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = <serde_json::Value as serde::Deserialize>::deserialize(deserializer)?;
    Ok(Price::from_json(&value).unwrap_or(Price::ZERO))
}

/// Decode a string that may be null or missing.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = <serde_json::Value as serde::Deserialize>::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}
