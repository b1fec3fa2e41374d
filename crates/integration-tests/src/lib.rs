//! Integration test harness for the Verdant storefront.
//!
//! [`MockApi`] binds an axum router to `127.0.0.1:0` that answers every
//! request from a table of canned responses and records what it received,
//! so tests can drive the real `reqwest` gateway end to end.
//!
//! # Example
//!
//! ```rust,ignore
//! let api = MockApi::start().await;
//! api.respond("GET", "/api/v1/get-all-categories", 200, json!([]));
//! let (storefront, _store) = api.storefront();
//! storefront.gateway().list_categories().await?;
//! assert_eq!(api.requests().len(), 1);
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use verdant_storefront::storage::{KeyValueStore, MemoryStore};
use verdant_storefront::{ClientConfig, Storefront};

/// Path prefix the mock API is mounted under.
pub const API_PREFIX: &str = "/api/v1";

/// A request received by the mock API.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RecordedRequest {
    /// Header value as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    /// Body parsed as JSON (`Null` when it is not JSON).
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    /// Body as lossy UTF-8 text.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Debug, Clone)]
enum Canned {
    Json(u16, Value),
    Text(u16, String),
}

#[derive(Default)]
struct MockState {
    routes: Mutex<HashMap<(String, String), Canned>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Mock commerce API listening on a random local port.
pub struct MockApi {
    addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockApi {
    /// Bind and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    #[allow(clippy::expect_used)]
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock API listener");
        let addr = listener
            .local_addr()
            .expect("Failed to read mock API address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state }
    }

    /// API base URL, including the `/api/v1` prefix.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}{API_PREFIX}", self.addr)
    }

    /// Answer `method path` (path without query, including the prefix) with JSON.
    pub fn respond(&self, method: &str, path: &str, status: u16, body: Value) {
        self.routes()
            .insert((method.to_string(), path.to_string()), Canned::Json(status, body));
    }

    /// Answer `method path` with a raw text body.
    pub fn respond_text(&self, method: &str, path: &str, status: u16, body: &str) {
        self.routes().insert(
            (method.to_string(), path.to_string()),
            Canned::Text(status, body.to_string()),
        );
    }

    /// Every request received so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Requests received for `path`.
    #[must_use]
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    /// Client configuration pointing at this mock, with caching enabled.
    ///
    /// # Panics
    ///
    /// Panics if the base URL is rejected.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(&self.base_url()).expect("mock base URL is valid");
        config.http_timeout = Duration::from_secs(5);
        config.cache_ttl = Some(Duration::from_secs(60));
        config
    }

    /// A storefront over an in-memory store, returned alongside the store.
    ///
    /// # Panics
    ///
    /// Panics if the storefront cannot be opened.
    #[must_use]
    pub fn storefront(&self) -> (Storefront, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (self.storefront_with(store.clone()), store)
    }

    /// A storefront over `store`.
    ///
    /// # Panics
    ///
    /// Panics if the storefront cannot be opened.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn storefront_with(&self, store: Arc<dyn KeyValueStore>) -> Storefront {
        Storefront::with_store(self.config(), store).expect("Failed to open storefront")
    }

    fn routes(&self) -> std::sync::MutexGuard<'_, HashMap<(String, String), Canned>> {
        self.state
            .routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Full API path for `endpoint`, e.g. `api_path("/login")`.
#[must_use]
pub fn api_path(endpoint: &str) -> String {
    format!("{API_PREFIX}{endpoint}")
}

async fn handle(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    state
        .requests
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(RecordedRequest {
            method: method.to_string(),
            path: path.clone(),
            query: uri.query().map(str::to_string),
            headers,
            body,
        });

    let canned = state
        .routes
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&(method.to_string(), path))
        .cloned();

    match canned {
        Some(Canned::Json(status, body)) => (status_code(status), axum::Json(body)).into_response(),
        Some(Canned::Text(status, body)) => (status_code(status), body).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            axum::Json(json!({ "message": "Route not mocked" })),
        )
            .into_response(),
    }
}

fn status_code(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}
