//! Integration test harness for the storefront client.
//!
//! [`MockBackend`] serves a small axum router on `127.0.0.1:0` that behaves
//! like the storefront backend: it issues and rotates credentials, rejects
//! stale bearer tokens with 401, and counts calls so tests can assert how
//! many renewals and retries happened.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p storefront-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
// axum handlers are async whether or not they await.
#![allow(clippy::unused_async)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::extract::{Path, RawQuery, State};
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use storefront_client::{ApiClient, ClientConfig};
use storefront_core::storage::keys;
use storefront_core::{MemoryStorage, Storage};

/// Access credential the backend accepts before any renewal.
pub const INITIAL_ACCESS: &str = "access-0";
/// Refresh credential the backend accepts before any renewal.
pub const INITIAL_REFRESH: &str = "refresh-0";
/// Password accepted by `/auth/login`.
pub const PASSWORD: &str = "correct horse";

/// How long `/auth/refresh` takes, so concurrent 401s overlap a renewal.
const REFRESH_DELAY: Duration = Duration::from_millis(100);

/// Shared backend state and call counters.
#[derive(Debug)]
pub struct BackendState {
    access_token: Mutex<String>,
    refresh_token: Mutex<String>,
    generation: AtomicUsize,

    /// Calls to `/auth/refresh`.
    pub refresh_calls: AtomicUsize,
    /// Calls to `/always-401`.
    pub unauthorized_calls: AtomicUsize,
    /// Calls to `/auth/logout`.
    pub logout_calls: AtomicUsize,

    /// Make `/auth/refresh` answer 401.
    pub reject_refresh: AtomicBool,
    /// Make `/auth/logout` answer 500.
    pub fail_logout: AtomicBool,

    /// Most recent JSON body received on a recorded route.
    pub last_body: Mutex<Option<Value>>,
    /// Most recent query string received on a recorded route.
    pub last_query: Mutex<Option<String>>,
    /// Most recent raw (still percent-encoded) path on a recorded route.
    pub last_path: Mutex<Option<String>>,
}

impl Default for BackendState {
    fn default() -> Self {
        Self {
            access_token: Mutex::new(INITIAL_ACCESS.to_string()),
            refresh_token: Mutex::new(INITIAL_REFRESH.to_string()),
            generation: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            unauthorized_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
            reject_refresh: AtomicBool::new(false),
            fail_logout: AtomicBool::new(false),
            last_body: Mutex::new(None),
            last_query: Mutex::new(None),
            last_path: Mutex::new(None),
        }
    }
}

impl BackendState {
    /// Number of `/auth/refresh` calls so far.
    #[must_use]
    pub fn refreshes(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    /// The last recorded JSON body.
    #[must_use]
    pub fn body(&self) -> Option<Value> {
        lock(&self.last_body).clone()
    }

    /// The last recorded query string.
    #[must_use]
    pub fn query(&self) -> Option<String> {
        lock(&self.last_query).clone()
    }

    /// The last recorded raw path.
    #[must_use]
    pub fn path(&self) -> Option<String> {
        lock(&self.last_path).clone()
    }

    fn current_access(&self) -> String {
        lock(&self.access_token).clone()
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let expected = format!("Bearer {}", self.current_access());
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value == expected)
    }

    fn rotate(&self) -> (String, String) {
        let n = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let access = format!("access-{n}");
        let refresh = format!("refresh-{n}");
        *lock(&self.access_token) = access.clone();
        *lock(&self.refresh_token) = refresh.clone();
        (access, refresh)
    }

    fn record_path(&self, uri: &Uri) {
        *lock(&self.last_path) = Some(uri.path().to_string());
    }

    fn record(&self, body: Option<Value>, query: Option<String>) {
        *lock(&self.last_body) = body;
        *lock(&self.last_query) = query;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A running mock backend.
pub struct MockBackend {
    /// Origin to point the client at.
    pub origin: String,
    /// Backend state and counters.
    pub state: Arc<BackendState>,
}

impl MockBackend {
    /// Bind to an ephemeral port and serve in the background.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let state = Arc::new(BackendState::default());
        let app = router(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let origin = format!("http://{}", listener.local_addr()?);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Mock backend stopped");
            }
        });

        Ok(Self { origin, state })
    }

    /// A client for this backend over fresh in-memory storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be built.
    pub fn client(&self) -> Result<(ApiClient, Arc<MemoryStorage>), Box<dyn std::error::Error>> {
        let storage = Arc::new(MemoryStorage::new());
        let config = ClientConfig::new(&self.origin)?;
        let api = ApiClient::new(&config, storage.clone())?;
        Ok((api, storage))
    }

    /// A client whose storage holds a stale access credential and a valid
    /// refresh credential, so its first protected call triggers a renewal.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be built.
    pub fn client_with_stale_session(
        &self,
    ) -> Result<(ApiClient, Arc<MemoryStorage>), Box<dyn std::error::Error>> {
        let (api, storage) = self.client()?;
        storage.set_many(&[
            (keys::ACCESS_TOKEN, "stale"),
            (keys::REFRESH_TOKEN, INITIAL_REFRESH),
        ])?;
        Ok((api, storage))
    }
}

fn router(state: Arc<BackendState>) -> Router {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/categories", get(list_categories))
        .route("/products/{id}", get(show_product))
        .route("/products/category/{category}", get(list_category))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/cart", get(get_cart).post(add_to_cart).delete(clear_cart))
        .route("/cart/{id}", patch(update_cart_row).delete(remove_cart_row))
        .route(
            "/reviews/{product_id}",
            get(list_reviews).post(submit_review).delete(delete_review),
        )
        .route("/always-401", get(always_unauthorized))
        .route("/empty", get(empty_body))
        .route("/broken", get(broken))
        .with_state(state)
}

// =============================================================================
// Handlers
// =============================================================================

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": "Token expired"})),
    )
        .into_response()
}

async fn list_products(State(state): State<Arc<BackendState>>, RawQuery(query): RawQuery) -> Response {
    state.record(None, query);
    Json(json!([
        {
            "_id": "p1",
            "title": "Mug",
            "price": "8.50",
            "imageUrl": "mug.png",
            "category": {"_id": "c1", "name": "kitchen"}
        },
        {
            "id": 2,
            "title": "Cap",
            "price": 12,
            "image": "cap.png",
            "category": "hats",
            "rating": {"rate": 4.5, "count": 10}
        }
    ]))
    .into_response()
}

async fn list_categories() -> Response {
    Json(json!(["hats", {"_id": "c1", "name": "kitchen"}])).into_response()
}

async fn show_product(Path(id): Path<String>) -> Response {
    match id.as_str() {
        "missing" => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Product not found"})),
        )
            .into_response(),
        "ghost" => Json(Value::Null).into_response(),
        _ => Json(json!({"_id": id, "title": "Tee", "price": 19.9, "imageUrl": "tee.png"}))
            .into_response(),
    }
}

async fn list_category(
    State(state): State<Arc<BackendState>>,
    Path(category): Path<String>,
    RawQuery(query): RawQuery,
    uri: Uri,
) -> Response {
    state.record_path(&uri);
    state.record(Some(json!({"category": category})), query);
    Json(json!([
        {
            "_id": "p7",
            "title": "Scarf",
            "price": "15",
            "imageUrl": "scarf.png",
            "category": {"_id": "c9", "name": category}
        }
    ]))
    .into_response()
}

async fn register(State(state): State<Arc<BackendState>>, Json(body): Json<Value>) -> Response {
    state.record(Some(body.clone()), None);
    if body.get("email").and_then(Value::as_str) == Some("taken@example.com") {
        return (
            StatusCode::CONFLICT,
            Json(json!({"error": "Email already registered"})),
        )
            .into_response();
    }

    let (access, refresh) = state.rotate();
    Json(json!({
        "accessToken": access,
        "refreshToken": refresh,
        "user": {"_id": "u2", "name": body.get("name"), "email": body.get("email")}
    }))
    .into_response()
}

async fn login(State(state): State<Arc<BackendState>>, Json(body): Json<Value>) -> Response {
    if body.get("password").and_then(Value::as_str) != Some(PASSWORD) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Invalid credentials"})),
        )
            .into_response();
    }

    let (access, refresh) = state.rotate();
    Json(json!({
        "accessToken": access,
        "refreshToken": refresh,
        "user": {"_id": "u1", "name": "Ana", "email": body.get("email")}
    }))
    .into_response()
}

async fn refresh(State(state): State<Arc<BackendState>>, Json(body): Json<Value>) -> Response {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(REFRESH_DELAY).await;

    let presented = body.get("refreshToken").and_then(Value::as_str);
    let expected = lock(&state.refresh_token).clone();
    if state.reject_refresh.load(Ordering::SeqCst) || presented != Some(expected.as_str()) {
        return unauthorized();
    }

    let (access, refresh) = state.rotate();
    Json(json!({"accessToken": access, "refreshToken": refresh})).into_response()
}

async fn logout(State(state): State<Arc<BackendState>>, Json(body): Json<Value>) -> Response {
    state.logout_calls.fetch_add(1, Ordering::SeqCst);
    state.record(Some(body), None);

    if state.fail_logout.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Logout failed"})),
        )
            .into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn get_cart(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    Json(json!([
        {
            "productId": "p1",
            "product": {"_id": "p1", "title": "Mug", "price": 8},
            "quantity": 2
        },
        {
            "product": {"_id": "p2", "title": "Cap", "price": "12.50", "imageUrl": "cap.png"},
            "size": "L"
        }
    ]))
    .into_response()
}

async fn add_to_cart(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    state.record(Some(body), None);
    (StatusCode::CREATED, Json(json!({"ok": true}))).into_response()
}

async fn clear_cart(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn update_cart_row(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    RawQuery(query): RawQuery,
    Json(body): Json<Value>,
) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    state.record(Some(body), query);
    Json(json!({"productId": id})).into_response()
}

async fn remove_cart_row(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    RawQuery(query): RawQuery,
) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    state.record(Some(json!({"productId": id})), query);
    StatusCode::NO_CONTENT.into_response()
}

async fn list_reviews(Path(product_id): Path<String>) -> Response {
    Json(json!([
        {"_id": "r1", "productId": product_id, "rating": 4, "comment": "Fits well"}
    ]))
    .into_response()
}

async fn submit_review(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    uri: Uri,
    Json(body): Json<Value>,
) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    state.record_path(&uri);
    state.record(Some(body.clone()), None);
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn delete_review(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    state.record_path(&uri);
    StatusCode::NO_CONTENT.into_response()
}

async fn always_unauthorized(State(state): State<Arc<BackendState>>) -> Response {
    state.unauthorized_calls.fetch_add(1, Ordering::SeqCst);
    unauthorized()
}

async fn empty_body() -> Response {
    StatusCode::OK.into_response()
}

async fn broken() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response()
}
