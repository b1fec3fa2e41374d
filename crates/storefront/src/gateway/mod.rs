//! Remote commerce API gateway.
//!
//! # Architecture
//!
//! - One method per remote resource, each a single HTTP call over `reqwest`
//! - Response bodies are normalized into the canonical records in [`types`]
//!   regardless of which known layout the API returned
//! - Catalog reads (products, single product, categories) are cached via
//!   `moka`; orders, sessions, reviews and account calls never are
//! - Every request carries an `x-request-id` and, when signed in, a bearer
//!   token from the [`CredentialStore`]
//!
//! Failures are never retried; they surface once as [`GatewayError`].

mod cache;
pub mod extract;
pub mod normalize;
pub mod types;

pub use types::*;

use std::fmt;
use std::sync::Arc;

use moka::future::Cache;
use reqwest::cookie::Jar;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use secrecy::ExposeSecret;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{Span, debug, error, instrument, warn};
use url::Url;
use uuid::Uuid;
use verdant_core::{Email, OrderId, ProductId};

use crate::checkout::CheckoutApi;
use crate::config::ClientConfig;
use crate::credential::CredentialStore;

use cache::{CacheKey, CacheValue};

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest error body excerpt written to logs.
const LOG_BODY_LIMIT: usize = 500;

// =============================================================================
// Errors
// =============================================================================

/// Remote resource a request was addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Products,
    Product,
    Categories,
    Reviews,
    Order,
    CheckoutSession,
    Login,
    Register,
    Profile,
}

impl Resource {
    /// Message shown when the API gave no usable one.
    #[must_use]
    pub const fn fallback_message(self) -> &'static str {
        match self {
            Self::Products => "Failed to fetch products",
            Self::Product => "Failed to fetch product",
            Self::Categories => "Failed to fetch categories",
            Self::Reviews => "Failed to fetch reviews",
            Self::Order => "Failed to create order",
            Self::CheckoutSession => "Failed to create checkout session",
            Self::Login => "Login failed",
            Self::Register => "Register failed",
            Self::Profile => "Could not load profile",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Products => "products",
            Self::Product => "product",
            Self::Categories => "categories",
            Self::Reviews => "reviews",
            Self::Order => "order",
            Self::CheckoutSession => "checkout session",
            Self::Login => "login",
            Self::Register => "register",
            Self::Profile => "profile",
        })
    }
}

/// Errors raised by the gateway.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// Non-2xx response, or a transport failure (`status` is `None`).
    #[error("{resource} request failed: {message}")]
    RemoteRequestFailed {
        resource: Resource,
        status: Option<u16>,
        message: String,
    },

    /// An authenticated call was attempted without a token.
    #[error("not signed in")]
    NotAuthenticated,

    /// The API rejected the stored token.
    #[error("session expired")]
    SessionExpired,

    /// A single-record body matched no known layout.
    #[error("unexpected {resource} response shape")]
    UnexpectedShape { resource: Resource },

    /// A client-side precondition failed; no request was made.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The HTTP client could not be constructed.
    #[error("gateway setup failed: {0}")]
    Setup(String),
}

impl GatewayError {
    /// Message suitable for showing to the shopper.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::RemoteRequestFailed { message, .. } | Self::InvalidInput(message) => {
                message.clone()
            }
            Self::NotAuthenticated => "Please log in to continue".to_string(),
            Self::SessionExpired => "Your session has expired. Please log in again.".to_string(),
            Self::UnexpectedShape { resource } => resource.fallback_message().to_string(),
            Self::Setup(_) => "The store is unavailable right now".to_string(),
        }
    }

    /// HTTP status of a failed remote call, when one was received.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::RemoteRequestFailed { status, .. } => *status,
            _ => None,
        }
    }
}

// =============================================================================
// CommerceClient
// =============================================================================

/// Client for the remote commerce API.
///
/// Cheaply cloneable; clones share the HTTP connection pool, cache and
/// credential.
#[derive(Clone)]
pub struct CommerceClient {
    inner: Arc<CommerceClientInner>,
}

struct CommerceClientInner {
    client: reqwest::Client,
    config: ClientConfig,
    credentials: CredentialStore,
    cache: Option<Cache<CacheKey, CacheValue>>,
}

impl fmt::Debug for CommerceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommerceClient")
            .field("api_base", &self.inner.config.api_base)
            .field("credentials", &self.inner.credentials)
            .finish_non_exhaustive()
    }
}

impl CommerceClient {
    /// Create a client sharing `jar` with the credential store.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Setup` if the HTTP client cannot be built.
    pub fn new(
        config: ClientConfig,
        credentials: CredentialStore,
        jar: Arc<Jar>,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .cookie_provider(jar)
            .build()
            .map_err(|e| GatewayError::Setup(e.to_string()))?;

        let cache = config.cache_ttl.map(|ttl| {
            Cache::builder()
                .max_capacity(1000)
                .time_to_live(ttl)
                .build()
        });

        Ok(Self {
            inner: Arc::new(CommerceClientInner {
                client,
                config,
                credentials,
                cache,
            }),
        })
    }

    /// The credential store used for bearer auth.
    #[must_use]
    pub fn credentials(&self) -> &CredentialStore {
        &self.inner.credentials
    }

    /// Send a request and return its JSON body.
    ///
    /// Empty or non-JSON success bodies decode to `Value::Null`.
    #[instrument(skip_all, fields(resource = %resource, request_id = tracing::field::Empty))]
    async fn send(
        &self,
        resource: Resource,
        request: reqwest::RequestBuilder,
    ) -> Result<Value, GatewayError> {
        let request_id = Uuid::new_v4().to_string();
        Span::current().record("request_id", &request_id);

        let mut request = request.header(REQUEST_ID_HEADER, &request_id);
        if let Some(bearer) = self.inner.credentials.bearer() {
            request = request.header(AUTHORIZATION, bearer.expose_secret());
        }

        let response = request.send().await.map_err(|e| {
            error!(error = %e, "Request to commerce API failed");
            GatewayError::RemoteRequestFailed {
                resource,
                status: None,
                message: resource.fallback_message().to_string(),
            }
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            error!(error = %e, status = %status, "Failed to read response body");
            GatewayError::RemoteRequestFailed {
                resource,
                status: Some(status.as_u16()),
                message: resource.fallback_message().to_string(),
            }
        })?;

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or_else(|e| {
                warn!(
                    error = %e,
                    body = %text.chars().take(LOG_BODY_LIMIT).collect::<String>(),
                    "Response body is not JSON"
                );
                Value::Null
            })
        };

        if !status.is_success() {
            error!(
                status = %status,
                body = %text.chars().take(LOG_BODY_LIMIT).collect::<String>(),
                "Commerce API returned non-success status"
            );
            return Err(GatewayError::RemoteRequestFailed {
                resource,
                status: Some(status.as_u16()),
                message: normalize::error_message(&body)
                    .unwrap_or_else(|| resource.fallback_message().to_string()),
            });
        }

        debug!(status = %status, "Commerce API request succeeded");
        Ok(body)
    }

    fn url(&self, path: &str) -> Result<Url, GatewayError> {
        Url::parse(&self.inner.config.endpoint(path))
            .map_err(|e| GatewayError::Setup(format!("invalid endpoint {path}: {e}")))
    }

    async fn cached(&self, key: &CacheKey) -> Option<CacheValue> {
        let value = self.inner.cache.as_ref()?.get(key).await;
        if value.is_some() {
            debug!(key = ?key, "Cache hit");
        }
        value
    }

    async fn remember(&self, key: CacheKey, value: CacheValue) {
        if let Some(cache) = &self.inner.cache {
            cache.insert(key, value).await;
        }
    }

    // =========================================================================
    // Catalog Methods
    // =========================================================================

    /// List products matching `query`.
    ///
    /// Unrecognized response layouts yield an empty list.
    ///
    /// # Errors
    ///
    /// Returns `RemoteRequestFailed` if the API call fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, GatewayError> {
        let key = CacheKey::Products(query.clone());
        if let Some(CacheValue::Products(products)) = self.cached(&key).await {
            return Ok(products);
        }

        let mut url = self.url("/get-all-products")?;
        url.query_pairs_mut().extend_pairs(query.to_pairs());

        let body = self
            .send(Resource::Products, self.inner.client.get(url))
            .await?;
        let products = normalize::products(&body, &self.inner.config.asset_base);

        self.remember(key, CacheValue::Products(products.clone()))
            .await;
        Ok(products)
    }

    /// Fetch one product.
    ///
    /// # Errors
    ///
    /// Returns `RemoteRequestFailed` if the API call fails, or
    /// `UnexpectedShape` if the body holds no product.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<ProductDetail, GatewayError> {
        let key = CacheKey::Product(id.to_string());
        if let Some(CacheValue::Product(detail)) = self.cached(&key).await {
            return Ok(*detail);
        }

        let url = self.url(&format!("/get-product/{}", urlencoding::encode(id.as_str())))?;
        let body = self
            .send(Resource::Product, self.inner.client.get(url))
            .await?;
        let detail = normalize::product_detail(&body, &self.inner.config.asset_base).ok_or(
            GatewayError::UnexpectedShape {
                resource: Resource::Product,
            },
        )?;

        self.remember(key, CacheValue::Product(Box::new(detail.clone())))
            .await;
        Ok(detail)
    }

    /// List all categories.
    ///
    /// # Errors
    ///
    /// Returns `RemoteRequestFailed` if the API call fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, GatewayError> {
        if let Some(CacheValue::Categories(categories)) = self.cached(&CacheKey::Categories).await {
            return Ok(categories);
        }

        let url = self.url("/get-all-categories")?;
        let body = self
            .send(Resource::Categories, self.inner.client.get(url))
            .await?;
        let categories = normalize::categories(&body, &self.inner.config.asset_base);

        self.remember(CacheKey::Categories, CacheValue::Categories(categories.clone()))
            .await;
        Ok(categories)
    }

    /// Fetch reviews for a product. Never cached.
    ///
    /// # Errors
    ///
    /// Returns `RemoteRequestFailed` if the API call fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_reviews(&self, product_id: &ProductId) -> Result<Vec<Review>, GatewayError> {
        let url = self.url(&format!(
            "/user/get-product-reviews/{}",
            urlencoding::encode(product_id.as_str())
        ))?;
        let body = self
            .send(Resource::Reviews, self.inner.client.get(url))
            .await?;
        Ok(normalize::reviews(&body))
    }

    /// Drop every cached catalog response.
    pub async fn invalidate_catalog(&self) {
        if let Some(cache) = &self.inner.cache {
            cache.invalidate_all();
            cache.run_pending_tasks().await;
        }
    }

    // =========================================================================
    // Account Methods
    // =========================================================================

    /// Sign in with email and password.
    ///
    /// Returns whether the response carried a token (which is then stored).
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a malformed email or empty password, or
    /// `RemoteRequestFailed` if the API rejects the login.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<bool, GatewayError> {
        let email = Email::parse(email).map_err(|e| GatewayError::InvalidInput(e.to_string()))?;
        if password.is_empty() {
            return Err(GatewayError::InvalidInput("Password is required".to_string()));
        }

        let url = self.url("/login")?;
        let request = self
            .inner
            .client
            .post(url)
            .json(&json!({ "email": email.as_str(), "password": password }));
        let body = self.send(Resource::Login, request).await?;

        Ok(self.store_token(&body))
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a missing name, malformed email or empty
    /// password, or `RemoteRequestFailed` if the API rejects the form.
    #[instrument(skip_all, fields(email = %form.email))]
    pub async fn register(&self, form: RegistrationForm) -> Result<RegisterOutcome, GatewayError> {
        if form.name.trim().is_empty() {
            return Err(GatewayError::InvalidInput("Name is required".to_string()));
        }
        let email =
            Email::parse(&form.email).map_err(|e| GatewayError::InvalidInput(e.to_string()))?;
        if form.password.expose_secret().is_empty() {
            return Err(GatewayError::InvalidInput("Password is required".to_string()));
        }

        let mut multipart = Form::new()
            .text("name", form.name.trim().to_string())
            .text("email", email.into_inner())
            .text("password", form.password.expose_secret().to_string())
            .text("address", form.address)
            .text("phone", form.phone);
        if let Some(image) = form.profile_image {
            multipart = multipart.part(
                "profileImage",
                Part::bytes(image.bytes).file_name(image.file_name),
            );
        }

        let url = self.url("/register")?;
        let body = self
            .send(Resource::Register, self.inner.client.post(url).multipart(multipart))
            .await?;

        Ok(if self.store_token(&body) {
            RegisterOutcome::SignedIn
        } else {
            RegisterOutcome::Registered
        })
    }

    /// Fetch the signed-in customer's profile.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` without a request when signed out,
    /// `SessionExpired` (after clearing the token) on a 401, or
    /// `UnexpectedShape` if the body holds no profile.
    #[instrument(skip(self))]
    pub async fn profile(&self) -> Result<Profile, GatewayError> {
        if !self.inner.credentials.is_authenticated() {
            return Err(GatewayError::NotAuthenticated);
        }

        let url = self.url("/profile")?;
        let body = match self.send(Resource::Profile, self.inner.client.get(url)).await {
            Ok(body) => body,
            Err(e) if e.status() == Some(401) => {
                warn!("Stored credential rejected; signing out");
                self.inner.credentials.clear();
                return Err(GatewayError::SessionExpired);
            }
            Err(e) => return Err(e),
        };

        normalize::profile(&body, &self.inner.config.asset_base).ok_or(
            GatewayError::UnexpectedShape {
                resource: Resource::Profile,
            },
        )
    }

    /// Forget the stored credential.
    pub fn logout(&self) {
        self.inner.credentials.clear();
    }

    fn store_token(&self, body: &Value) -> bool {
        extract::token(body).is_some_and(|token| {
            self.inner.credentials.set(&token);
            true
        })
    }
}

// =============================================================================
// Order Methods
// =============================================================================

impl CheckoutApi for CommerceClient {
    #[instrument(skip_all, fields(lines = payload.lines.len()))]
    async fn create_order(&self, payload: &OrderPayload) -> Result<CreatedOrder, GatewayError> {
        let url = self.url("/user/create-order")?;
        let raw = self
            .send(Resource::Order, self.inner.client.post(url).json(payload))
            .await?;
        Ok(CreatedOrder { raw })
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    async fn create_checkout_session(
        &self,
        order_id: &OrderId,
    ) -> Result<CheckoutSession, GatewayError> {
        let url = self.url("/user/create-checkout-session")?;
        let raw = self
            .send(
                Resource::CheckoutSession,
                self.inner
                    .client
                    .post(url)
                    .json(&json!({ "orderId": order_id.as_str() })),
            )
            .await?;
        Ok(CheckoutSession::from_body(raw))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn client(cache_ttl: Option<std::time::Duration>) -> CommerceClient {
        let mut config = ClientConfig::new("http://127.0.0.1:9/api/v1").unwrap();
        config.cache_ttl = cache_ttl;
        config.http_timeout = std::time::Duration::from_millis(500);
        let credentials = CredentialStore::new(Arc::new(MemoryStore::new()));
        CommerceClient::new(config, credentials, Arc::new(Jar::default())).unwrap()
    }

    #[test]
    fn test_user_message_prefers_remote_text() {
        let err = GatewayError::RemoteRequestFailed {
            resource: Resource::Order,
            status: Some(400),
            message: "Out of stock".to_string(),
        };
        assert_eq!(err.user_message(), "Out of stock");
        assert_eq!(err.status(), Some(400));
        assert_eq!(
            GatewayError::UnexpectedShape { resource: Resource::Product }.user_message(),
            "Failed to fetch product"
        );
    }

    #[tokio::test]
    async fn test_profile_without_token_makes_no_request() {
        let client = client(None);
        assert!(matches!(
            client.profile().await,
            Err(GatewayError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_login_rejects_bad_email_before_request() {
        let client = client(None);
        assert!(matches!(
            client.login("not-an-email", "pw").await,
            Err(GatewayError::InvalidInput(_))
        ));
        assert!(matches!(
            client.login("a@b.co", "").await,
            Err(GatewayError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_transport_failure_has_no_status() {
        let client = client(None);
        let err = client.list_categories().await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::RemoteRequestFailed {
                resource: Resource::Categories,
                status: None,
                ..
            }
        ));
        assert_eq!(err.user_message(), "Failed to fetch categories");
    }

    #[tokio::test]
    async fn test_cache_serves_stored_catalog() {
        let client = client(Some(std::time::Duration::from_secs(60)));
        let cached = vec![Category {
            id: "c1".into(),
            name: "Tea".to_string(),
            image: String::new(),
            description: String::new(),
        }];
        client
            .remember(CacheKey::Categories, CacheValue::Categories(cached.clone()))
            .await;
        assert_eq!(client.list_categories().await.unwrap(), cached);

        client.invalidate_catalog().await;
        assert!(client.list_categories().await.is_err());
    }

    #[test]
    fn test_logout_clears_credential() {
        let client = client(None);
        client.credentials().set("tok");
        assert!(client.credentials().is_authenticated());
        client.logout();
        assert!(!client.credentials().is_authenticated());
    }
}
