//! Storefront root object.
//!
//! Everything is constructed once at startup and handed out as cheap
//! shared handles; there is no ambient global state.

use std::sync::Arc;

use reqwest::cookie::Jar;
use tracing::{debug, info};
use url::Url;
use verdant_core::ProductId;

use crate::checkout::{BillingDetails, CheckoutError, CheckoutOutcome, OrderOrchestrator};
use crate::collections::{CartStore, LineItem, WishlistStore, WishlistToggle};
use crate::config::{ClientConfig, ConfigError};
use crate::credential::CredentialStore;
use crate::error::{Result, StorefrontError};
use crate::gateway::CommerceClient;
use crate::storage::{FileStore, KeyValueStore, StorageError};

/// Process-wide storefront state.
///
/// This struct is cheaply cloneable via `Arc`; clones share the same cart,
/// wishlist, credential and in-flight order.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: ClientConfig,
    credentials: CredentialStore,
    cart: CartStore,
    wishlist: WishlistStore,
    gateway: CommerceClient,
    orders: OrderOrchestrator<CommerceClient>,
}

impl std::fmt::Debug for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("api_base", &self.inner.config.api_base)
            .field("cart_lines", &self.inner.cart.len())
            .field("wishlist_entries", &self.inner.wishlist.len())
            .finish_non_exhaustive()
    }
}

impl Storefront {
    /// Open the storefront with a file store under `config.data_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created or the
    /// HTTP client cannot be built.
    pub fn open(config: ClientConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir).map_err(StorageError::from)?;
        let store = Arc::new(FileStore::new(config.data_dir.clone()));
        Self::with_store(config, store)
    }

    /// Open the storefront over any durable store.
    ///
    /// # Errors
    ///
    /// Returns an error if the API base is not a valid URL or the HTTP
    /// client cannot be built.
    pub fn with_store(config: ClientConfig, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let origin = Url::parse(&config.api_base).map_err(|e| {
            ConfigError::InvalidEnvVar("VERDANT_API_BASE".to_string(), e.to_string())
        })?;

        let jar = Arc::new(Jar::default());
        let credentials = CredentialStore::with_cookie_jar(store.clone(), jar.clone(), origin);
        let cart = CartStore::open(store.clone());
        let wishlist = WishlistStore::open(store);
        let gateway = CommerceClient::new(config.clone(), credentials.clone(), jar)?;
        let orders = OrderOrchestrator::new(gateway.clone(), cart.clone());

        info!(
            api_base = %config.api_base,
            cart_lines = cart.len(),
            wishlist_entries = wishlist.len(),
            signed_in = credentials.is_authenticated(),
            "Storefront opened"
        );

        Ok(Self {
            inner: Arc::new(StorefrontInner {
                config,
                credentials,
                cart,
                wishlist,
                gateway,
                orders,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn credentials(&self) -> &CredentialStore {
        &self.inner.credentials
    }

    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    #[must_use]
    pub fn wishlist(&self) -> &WishlistStore {
        &self.inner.wishlist
    }

    /// Get a reference to the remote API gateway.
    #[must_use]
    pub fn gateway(&self) -> &CommerceClient {
        &self.inner.gateway
    }

    /// Get a reference to the order orchestrator.
    #[must_use]
    pub fn orders(&self) -> &OrderOrchestrator<CommerceClient> {
        &self.inner.orders
    }

    /// Fetch a product and add `quantity` units of it to the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the product cannot be fetched.
    pub async fn add_to_cart(&self, product_id: &ProductId, quantity: u32) -> Result<LineItem> {
        let detail = self.inner.gateway.get_product(product_id).await?;
        self.inner.cart.add(detail.product.to_line_item(quantity));
        debug!(product_id = %product_id, quantity, "Added to cart");
        self.inner
            .cart
            .items()
            .into_iter()
            .find(|line| &line.product_id == product_id)
            .ok_or_else(|| StorefrontError::NotFound(format!("Cart line {product_id}")))
    }

    /// Toggle a product on the wishlist, fetching it when it is not saved yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the product has to be fetched and cannot be.
    pub async fn toggle_wishlist(&self, product_id: &ProductId) -> Result<WishlistToggle> {
        if let Some(entry) = self.inner.wishlist.get(product_id) {
            return Ok(self.inner.wishlist.toggle(entry));
        }
        let detail = self.inner.gateway.get_product(product_id).await?;
        Ok(self.inner.wishlist.toggle(detail.product.to_wish_entry()))
    }

    /// Toggle a saved product's presence in the cart.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product is not on the wishlist.
    pub fn move_to_cart(&self, product_id: &ProductId) -> Result<bool> {
        self.inner
            .wishlist
            .move_to_cart(product_id, &self.inner.cart)
            .ok_or_else(|| StorefrontError::NotFound(format!("Wishlist item {product_id}")))
    }

    /// Place an order for the current cart contents.
    ///
    /// # Errors
    ///
    /// See [`OrderOrchestrator::place_order`].
    pub async fn place_order(
        &self,
        billing: &BillingDetails,
    ) -> std::result::Result<CheckoutOutcome, CheckoutError> {
        let lines = self.inner.cart.items();
        self.inner.orders.place_order(&lines, billing).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::checkout::ValidationError;
    use crate::storage::MemoryStore;
    use verdant_core::Price;

    fn storefront(store: Arc<dyn KeyValueStore>) -> Storefront {
        Storefront::with_store(ClientConfig::new("http://127.0.0.1:9/api/v1").unwrap(), store)
            .unwrap()
    }

    #[test]
    fn test_hydrates_shared_state() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        store.set("token", "abc").unwrap();
        store
            .set("cart", r#"[{"id":"p1","title":"Tea","price":"5.00","qty":2}]"#)
            .unwrap();

        let storefront = storefront(store);
        assert!(storefront.credentials().is_authenticated());
        assert!(storefront.gateway().credentials().is_authenticated());
        assert_eq!(storefront.cart().unit_count(), 2);

        let clone = storefront.clone();
        clone.cart().clear();
        assert!(storefront.cart().is_empty());
    }

    #[test]
    fn test_move_to_cart_missing_is_not_found() {
        let storefront = storefront(Arc::new(MemoryStore::new()));
        assert!(matches!(
            storefront.move_to_cart(&ProductId::new("nope")),
            Err(StorefrontError::NotFound(_))
        ));

        storefront.wishlist().add(crate::collections::WishEntry::new(
            "p1",
            "Tea",
            Price::from_cents(500),
            "",
        ));
        assert!(storefront.move_to_cart(&ProductId::new("p1")).unwrap());
        assert_eq!(storefront.cart().len(), 1);
    }

    #[tokio::test]
    async fn test_place_order_with_empty_cart() {
        let storefront = storefront(Arc::new(MemoryStore::new()));
        let billing = BillingDetails {
            name: "Sam".to_string(),
            address: "1 Main St".to_string(),
            ..BillingDetails::default()
        };
        assert!(matches!(
            storefront.place_order(&billing).await,
            Err(CheckoutError::ValidationFailed(ValidationError::EmptyCart))
        ));
    }

    #[test]
    fn test_open_creates_data_dir() {
        let dir = std::env::temp_dir().join(format!("verdant-open-{}", uuid::Uuid::new_v4()));
        let mut config = ClientConfig::new("http://127.0.0.1:9/api/v1").unwrap();
        config.data_dir = dir.clone();
        let storefront = Storefront::open(config).unwrap();
        storefront.credentials().set("tok");
        let raw = std::fs::read_to_string(dir.join("token.json")).unwrap();
        assert_eq!(serde_json::from_str::<String>(&raw).unwrap(), "tok");
        std::fs::remove_dir_all(dir).unwrap();
    }
}
