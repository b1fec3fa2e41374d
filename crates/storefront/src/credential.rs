//! Bearer credential storage.
//!
//! Holds the opaque auth token returned by login/registration. The token is
//! persisted through the [`KeyValueStore`] as a JSON string and, when a
//! cookie jar is attached, mirrored as a short-lived `token` cookie for APIs
//! that read cookie auth.

use std::sync::{Arc, PoisonError, RwLock};

use reqwest::cookie::Jar;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};
use url::Url;

use crate::storage::{KeyValueStore, keys};

/// Lifetime of the mirrored cookie (7 days).
const COOKIE_MAX_AGE_SECS: u64 = 7 * 24 * 60 * 60;

/// Process-wide credential holder.
///
/// Cheaply cloneable; clones share the same token.
#[derive(Clone)]
pub struct CredentialStore {
    inner: Arc<CredentialStoreInner>,
}

struct CredentialStoreInner {
    storage: Arc<dyn KeyValueStore>,
    token: RwLock<Option<SecretString>>,
    cookies: Option<(Arc<Jar>, Url)>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

impl CredentialStore {
    /// Create a store, hydrating any previously persisted token.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self::build(storage, None)
    }

    /// Create a store that also mirrors the token into `jar` for `origin`.
    #[must_use]
    pub fn with_cookie_jar(storage: Arc<dyn KeyValueStore>, jar: Arc<Jar>, origin: Url) -> Self {
        Self::build(storage, Some((jar, origin)))
    }

    fn build(storage: Arc<dyn KeyValueStore>, cookies: Option<(Arc<Jar>, Url)>) -> Self {
        let token = match storage.get(keys::TOKEN) {
            Ok(value) => value
                .map(|raw| decode_token(&raw))
                .filter(|t| !t.trim().is_empty())
                .map(SecretString::from),
            Err(e) => {
                warn!(error = %e, "Failed to read persisted token; starting signed out");
                None
            }
        };

        let store = Self {
            inner: Arc::new(CredentialStoreInner {
                storage,
                token: RwLock::new(token),
                cookies,
            }),
        };
        if let Some(token) = store.token() {
            store.mirror_cookie(Some(token.expose_secret()));
        }
        store
    }

    /// Current token, if any.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether a token is present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// `Authorization` header value (`Bearer <token>`) when a token is present.
    #[must_use]
    pub fn bearer(&self) -> Option<SecretString> {
        self.token()
            .map(|t| SecretString::from(format!("Bearer {}", t.expose_secret())))
    }

    /// Store a new token. Empty tokens are ignored.
    ///
    /// Persistence is best-effort: the in-memory token is updated even if
    /// the durable write fails.
    pub fn set(&self, token: &str) {
        let token = token.trim();
        if token.is_empty() {
            return;
        }

        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(SecretString::from(token.to_string()));

        let encoded = serde_json::Value::from(token).to_string();
        if let Err(e) = self.inner.storage.set(keys::TOKEN, &encoded) {
            warn!(error = %e, "Failed to persist token");
        }
        self.mirror_cookie(Some(token));
        debug!("Credential stored");
    }

    /// Forget the token locally and in durable storage.
    pub fn clear(&self) {
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;

        if let Err(e) = self.inner.storage.remove(keys::TOKEN) {
            warn!(error = %e, "Failed to remove persisted token");
        }
        self.mirror_cookie(None);
        debug!("Credential cleared");
    }

    fn mirror_cookie(&self, token: Option<&str>) {
        let Some((jar, origin)) = &self.inner.cookies else {
            return;
        };
        let cookie = token.map_or_else(
            || "token=; Max-Age=0; Path=/".to_string(),
            |t| format!("token={t}; Max-Age={COOKIE_MAX_AGE_SECS}; Path=/"),
        );
        jar.add_cookie_str(&cookie, origin);
    }
}

/// Decode a persisted token. Bare strings written by older builds are
/// accepted as-is.
fn decode_token(raw: &str) -> String {
    serde_json::from_str::<String>(raw).unwrap_or_else(|_| raw.trim().to_string())
}
