//! Integration tests for Pocketshop.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p pocketshop-integration-tests
//! ```
//!
//! No external services are needed: [`FakeCatalog`] serves a small,
//! dummyjson-shaped product API on an ephemeral local port, records every
//! request it sees and can be told to throttle or slow down responses.

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use pocketshop_storefront::config::StorefrontConfig;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// How long [`within`] waits before failing a test.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Seconds advertised in `Retry-After` while throttling.
pub const RETRY_AFTER_SECS: u64 = 7;

/// Await `future`, panicking if it takes longer than [`TEST_TIMEOUT`].
///
/// # Panics
///
/// Panics on timeout.
pub async fn within<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(TEST_TIMEOUT, future)
        .await
        .expect("timed out waiting for condition")
}

// =============================================================================
// Fixtures
// =============================================================================

/// Five phones (IDs 1-5, $100 × n) and forty lamps (IDs 6-45, $50 each).
///
/// Product 1 carries the full detail payload: reviews, dimensions and meta.
#[must_use]
pub fn catalog_fixture() -> Vec<Value> {
    let phones = (1..=5).map(|n| {
        let mut phone = json!({
            "id": n,
            "title": format!("Phone Model {n}"),
            "description": format!("Generation {n} handset"),
            "category": "smartphones",
            "brand": "Pocket",
            "price": 100 * n,
            "rating": 4.5,
            "stock": 10 * n,
            "thumbnail": format!("https://cdn.example.com/phones/{n}/thumb.png"),
            "images": [format!("https://cdn.example.com/phones/{n}/1.png")],
        });
        if n == 1 {
            detail_fields(&mut phone);
        }
        phone
    });

    let lamps = (6..=45).map(|n| {
        json!({
            "id": n,
            "title": format!("Desk Lamp {n}"),
            "description": "Adjustable reading light",
            "category": "lighting",
            "price": 50,
            "rating": 3.9,
            "stock": 4,
            "thumbnail": format!("https://cdn.example.com/lamps/{n}/thumb.png"),
            "images": [],
        })
    });

    phones.chain(lamps).collect()
}

fn detail_fields(product: &mut Value) {
    let Value::Object(fields) = product else {
        return;
    };
    let extra = json!({
        "sku": "PKT-PHN-001",
        "weight": 180,
        "dimensions": { "width": 7.1, "height": 14.7, "depth": 0.8 },
        "warrantyInformation": "1 year warranty",
        "shippingInformation": "Ships in 2 days",
        "returnPolicy": "30 days return policy",
        "availabilityStatus": "In Stock",
        "discountPercentage": 5.5,
        "reviews": [
            {
                "rating": 5,
                "comment": "Great phone!",
                "date": "2024-05-23T08:56:21.618Z",
                "reviewerName": "Sam Lee",
                "reviewerEmail": "sam.lee@example.com"
            },
            {
                "rating": 3,
                "comment": "Battery could be better",
                "date": "2024-06-01T10:00:00.000Z",
                "reviewerName": "Ari Chen",
                "reviewerEmail": "ari.chen@example.com"
            }
        ],
        "meta": {
            "createdAt": "2024-05-23T08:56:21.618Z",
            "updatedAt": "2024-05-23T08:56:21.618Z",
            "barcode": "1234567890123",
            "qrCode": "https://cdn.example.com/qr.png"
        }
    });
    if let Value::Object(extra) = extra {
        fields.extend(extra);
    }
}

// =============================================================================
// Fake catalog server
// =============================================================================

struct FakeState {
    products: Vec<Value>,
    requests: Mutex<Vec<String>>,
    throttled: AtomicBool,
    delays: Mutex<HashMap<String, Duration>>,
}

impl FakeState {
    fn record(&self, uri: &Uri) {
        let request = uri
            .path_and_query()
            .map_or_else(|| uri.path().to_string(), ToString::to_string);
        self.requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(request);
    }

    fn throttle(&self) -> Option<Response> {
        self.throttled.load(Ordering::SeqCst).then(|| {
            (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, RETRY_AFTER_SECS.to_string())],
                "Too Many Requests",
            )
                .into_response()
        })
    }

    fn delay_for(&self, term: &str) -> Option<Duration> {
        self.delays
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(term)
            .copied()
    }
}

/// An in-process product API bound to `127.0.0.1:0`.
///
/// The server task is aborted when this value is dropped.
pub struct FakeCatalog {
    addr: SocketAddr,
    state: Arc<FakeState>,
    task: JoinHandle<()>,
}

impl FakeCatalog {
    /// Serve [`catalog_fixture`].
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        Self::with_products(catalog_fixture()).await
    }

    /// Serve `products`.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn with_products(products: Vec<Value>) -> Self {
        let state = Arc::new(FakeState {
            products,
            requests: Mutex::new(Vec::new()),
            throttled: AtomicBool::new(false),
            delays: Mutex::new(HashMap::new()),
        });

        let app = Router::new()
            .route("/products/search", get(search))
            .route("/products/{id}", get(product))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake catalog");
        let addr = listener.local_addr().expect("Failed to read local address");
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state, task }
    }

    /// Base URL with a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Storefront configuration pointing at this server, with short
    /// debounce and notice timings so tests run quickly.
    ///
    /// # Panics
    ///
    /// Panics if the local URL is rejected, which would be a bug.
    #[must_use]
    pub fn config(&self) -> StorefrontConfig {
        let mut config = StorefrontConfig::with_base_url(&self.base_url())
            .expect("fake catalog URL is valid");
        config.listing.search_debounce = Duration::from_millis(50);
        config.listing.notice_ttl = Duration::from_millis(200);
        config
    }

    /// Every request seen so far, as `path?query`.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.state
            .requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Search requests whose query contains `q={term}`.
    #[must_use]
    pub fn searches_for(&self, term: &str) -> Vec<String> {
        let needle = format!("q={term}&");
        self.requests()
            .into_iter()
            .filter(|r| r.starts_with("/products/search?") && r.contains(&needle))
            .collect()
    }

    /// Answer every request with 429 until turned off again.
    pub fn set_throttled(&self, throttled: bool) {
        self.state.throttled.store(throttled, Ordering::SeqCst);
    }

    /// Hold back search responses for `term`.
    pub fn delay_term(&self, term: &str, delay: Duration) {
        self.state
            .delays
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(term.to_string(), delay);
    }
}

impl Drop for FakeCatalog {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default)]
    skip: usize,
}

const fn default_limit() -> usize {
    30
}

async fn search(
    State(state): State<Arc<FakeState>>,
    uri: Uri,
    Query(params): Query<SearchParams>,
) -> Response {
    state.record(&uri);
    if let Some(response) = state.throttle() {
        return response;
    }
    if let Some(delay) = state.delay_for(&params.q) {
        tokio::time::sleep(delay).await;
    }

    let needle = params.q.to_lowercase();
    let matches: Vec<&Value> = state
        .products
        .iter()
        .filter(|product| matches_term(product, &needle))
        .collect();
    let total = matches.len();
    let products: Vec<Value> = matches
        .into_iter()
        .skip(params.skip)
        .take(params.limit)
        .cloned()
        .collect();

    Json(json!({
        "products": products,
        "total": total,
        "skip": params.skip,
        "limit": params.limit,
    }))
    .into_response()
}

async fn product(
    State(state): State<Arc<FakeState>>,
    uri: Uri,
    Path(id): Path<u32>,
) -> Response {
    state.record(&uri);
    if let Some(response) = state.throttle() {
        return response;
    }

    state
        .products
        .iter()
        .find(|product| product["id"] == json!(id))
        .map_or_else(
            || {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "message": format!("Product with id '{id}' not found") })),
                )
                    .into_response()
            },
            |product| Json(product.clone()).into_response(),
        )
}

fn matches_term(product: &Value, needle: &str) -> bool {
    needle.is_empty()
        || ["title", "description", "category", "brand"]
            .iter()
            .filter_map(|field| product[*field].as_str())
            .any(|text| text.to_lowercase().contains(needle))
}
