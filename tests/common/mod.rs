#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};

pub const USERNAME: &str = "dispatcher";
pub const PASSWORD: &str = "s3cret";

pub const ORDERS_PATH: &str = "/api/transactional/order/customer-order-header/";
pub const LEGACY_PATH: &str = "/api/legacy/list/";
pub const SLOW_PATH: &str = "/api/slow/";
/// Orders page that the fake upstream answers late.
pub const SLOW_PAGE: u64 = 3;

/// Shared knobs and counters of the fake upstream API.
#[derive(Default)]
pub struct Upstream {
    pub logins: AtomicUsize,
    pub refreshes: AtomicUsize,
    pub data_calls: AtomicUsize,
    pub refresh_fails: AtomicBool,
    /// The only bearer token the data endpoints accept.
    pub accepted: Mutex<String>,
    /// The access token handed out by the refresh endpoint.
    pub refreshed: Mutex<String>,
    pub last_body: Mutex<Option<Value>>,
    pub last_query: Mutex<Option<HashMap<String, String>>>,
}

impl Upstream {
    pub fn accept(&self, token: &str) {
        *self.accepted.lock().unwrap() = token.to_string();
    }

    pub fn refresh_to(&self, token: &str) {
        *self.refreshed.lock().unwrap() = token.to_string();
    }

    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    pub fn data_calls(&self) -> usize {
        self.data_calls.load(Ordering::SeqCst)
    }
}

pub struct MockServer {
    pub base_url: String,
    pub upstream: Arc<Upstream>,
}

/// Starts the fake upstream on an ephemeral port. It issues the pair
/// `access-1`/`refresh-1` and accepts `access-1` until told otherwise.
pub async fn spawn_upstream() -> MockServer {
    let upstream = Arc::new(Upstream::default());
    upstream.accept("access-1");
    upstream.refresh_to("access-2");

    let app = Router::new()
        .route("/api/token/", post(token))
        .route("/api/token/refresh/", post(refresh))
        .route(ORDERS_PATH, post(orders))
        .route(LEGACY_PATH, get(legacy))
        .route(SLOW_PATH, get(slow))
        .with_state(upstream.clone());

    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockServer {
        base_url: format!("http://{}", addr),
        upstream,
    }
}

fn authorized(upstream: &Upstream, headers: &HeaderMap) -> bool {
    let expected = format!("Bearer {}", upstream.accepted.lock().unwrap());
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == expected)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Given token not valid for any token type"})),
    )
        .into_response()
}

async fn token(State(upstream): State<Arc<Upstream>>, Json(body): Json<Value>) -> Response {
    upstream.logins.fetch_add(1, Ordering::SeqCst);
    if body["username"] == USERNAME && body["password"] == PASSWORD {
        Json(json!({"access": "access-1", "refresh": "refresh-1"})).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "No active account found with the given credentials"})),
        )
            .into_response()
    }
}

async fn refresh(State(upstream): State<Arc<Upstream>>, Json(body): Json<Value>) -> Response {
    upstream.refreshes.fetch_add(1, Ordering::SeqCst);
    if upstream.refresh_fails.load(Ordering::SeqCst) || body["refresh"] != "refresh-1" {
        return unauthorized();
    }
    let access = upstream.refreshed.lock().unwrap().clone();
    Json(json!({ "access": access })).into_response()
}

async fn orders(
    State(upstream): State<Arc<Upstream>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    upstream.data_calls.fetch_add(1, Ordering::SeqCst);
    if !authorized(&upstream, &headers) {
        return unauthorized();
    }
    if body["page"] == SLOW_PAGE {
        tokio::time::sleep(Duration::from_millis(300)).await;
    }
    *upstream.last_body.lock().unwrap() = Some(body);

    Json(json!({
        "data": [
            {"order_id": "SO-1", "deleted": false},
            {"order_id": "SO-2", "deleted": 1},
            {"order_id": "SO-3", "deleted": "0"},
        ],
        "total_count": 257,
    }))
    .into_response()
}

async fn legacy(
    State(upstream): State<Arc<Upstream>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    upstream.data_calls.fetch_add(1, Ordering::SeqCst);
    if !authorized(&upstream, &headers) {
        return unauthorized();
    }
    *upstream.last_query.lock().unwrap() = Some(query);

    Json(json!({
        "result": [{"id": 1}, {"id": 2}],
        "total": 2,
    }))
    .into_response()
}

async fn slow() -> Response {
    tokio::time::sleep(Duration::from_secs(5)).await;
    Json(json!({"data": []})).into_response()
}
