//! Verdant storefront client library.
//!
//! Client-side state for a storefront backed by a remote commerce API:
//! a durably persisted cart and wishlist, a bearer credential, a gateway
//! that normalizes the API's loosely-shaped responses, and the checkout
//! orchestrator that turns the cart into an order and a payment session.
//!
//! # Example
//!
//! ```rust,ignore
//! use verdant_storefront::{ClientConfig, Storefront, checkout::BillingDetails};
//!
//! let storefront = Storefront::open(ClientConfig::from_env()?)?;
//! storefront.add_to_cart(&"p1".into(), 2).await?;
//!
//! let outcome = storefront.place_order(&billing).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checkout;
pub mod collections;
pub mod config;
pub mod credential;
pub mod error;
pub mod gateway;
pub mod state;
pub mod storage;

pub use config::ClientConfig;
pub use error::{Result, StorefrontError};
pub use state::Storefront;
