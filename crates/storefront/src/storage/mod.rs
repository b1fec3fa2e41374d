//! Durable key-value storage capability.
//!
//! The cart, wishlist and credential persist through a small `get/set/remove`
//! interface so the state layer is testable without a real durable medium.
//!
//! # Implementations
//!
//! - [`MemoryStore`] - In-process map, optionally failing to simulate an
//!   unavailable medium
//! - [`FileStore`] - One JSON file per key under a data directory

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Errors raised by a [`KeyValueStore`].
#[derive(Debug, Error)]
pub enum StorageError {
    /// The underlying medium failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The medium is not available (e.g. quota exceeded, disabled).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A stored value could not be encoded or decoded.
    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Keys for persisted client state.
pub mod keys {
    /// Key for the cart snapshot (JSON array of line items).
    pub const CART: &str = "cart";

    /// Key for the wishlist snapshot (JSON array of wish entries).
    pub const WISHLIST: &str = "wishlist";

    /// Key for the bearer token.
    pub const TOKEN: &str = "token";
}

/// A durable string-to-string store.
///
/// Implementations must be usable from any thread; every call is
/// synchronous and completes before returning.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the medium cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the medium cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
