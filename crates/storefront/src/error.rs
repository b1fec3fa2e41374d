//! Unified error type for the storefront.

use thiserror::Error;

use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::gateway::GatewayError;
use crate::storage::StorageError;

/// Top-level error for storefront operations.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Configuration was missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The durable store could not be opened.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A remote API call failed.
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Placing an order failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// A local lookup found nothing.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl StorefrontError {
    /// Message suitable for showing to the shopper.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Gateway(e) => e.user_message(),
            Self::Checkout(e) => e.user_message(),
            Self::NotFound(what) => format!("{what} not found"),
            Self::Config(_) | Self::Storage(_) => self.to_string(),
        }
    }
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;
