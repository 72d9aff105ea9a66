//! Fake search cluster for integration tests.
//!
//! Spins up a minimal `axum` HTTP server on a random TCP port bound to
//! 127.0.0.1. Serves the three scroll endpoints:
//! - `POST /{index}/_search?scroll=..` returns the configured first reply
//! - `POST /_search/scroll` returns queued replies, then an empty page
//! - `DELETE /_search/scroll` acknowledges the clear
//!
//! The crate under test is blocking, so the server runs on a current-thread
//! tokio runtime inside its own `std::thread`. Every request is recorded so
//! tests can assert on paths, headers and bodies.
//!
//! # Example
//!
//! ```rust,no_run
//! use common::fake_search_api::FakeSearchApi;
//!
//! let api = FakeSearchApi::with_pages(vec![vec![serde_json::json!({"message": "hi"})]]);
//! // Point the source at api.base_url()
//! let url = api.base_url();
//! ```

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::{Value, json};

/// A canned reply.
#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    Status(u16),
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self {
            Reply::Json(v) => (StatusCode::OK, Json(v)).into_response(),
            Reply::Status(code) => (
                StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                Json(json!({ "error": "fake failure" })),
            )
                .into_response(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path and query, e.g. `/logs-app/_search?scroll=2m`
    pub target: String,
    pub headers: HeaderMap,
    pub body: String,
}

impl RecordedRequest {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("request body is JSON")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// State shared between the router and test code.
#[derive(Default)]
struct ApiState {
    first: Option<Reply>,
    scroll: VecDeque<Reply>,
    requests: Vec<RecordedRequest>,
}

type Shared = Arc<Mutex<ApiState>>;

/// Handle to the running fake search cluster.
pub struct FakeSearchApi {
    addr: SocketAddr,
    state: Shared,
}

impl FakeSearchApi {
    /// Serve `first` for the initial search and `scroll` for the following
    /// scroll requests, in order. Returns once the port is bound.
    pub fn start(first: Reply, scroll: Vec<Reply>) -> Self {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind fake search api");
        listener.set_nonblocking(true).expect("nonblocking listener");
        let addr = listener.local_addr().expect("local addr");
        let state: Shared = Arc::new(Mutex::new(ApiState {
            first: Some(first),
            scroll: scroll.into(),
            requests: Vec::new(),
        }));

        let app = Router::new()
            .route("/_search/scroll", post(next_page).delete(clear_scroll))
            .route("/{index}/_search", post(first_page))
            .with_state(state.clone());

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("tokio runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).expect("tokio listener");
                axum::serve(listener, app).await.expect("serve fake search api");
            });
        });

        FakeSearchApi { addr, state }
    }

    /// Serve pages of documents: the first page from the initial search, the
    /// rest from scroll requests.
    pub fn with_pages(pages: Vec<Vec<Value>>) -> Self {
        let mut replies: VecDeque<Reply> = pages
            .into_iter()
            .enumerate()
            .map(|(i, docs)| Reply::Json(page("scroll-1", i * 1000, docs)))
            .collect();
        let first = replies
            .pop_front()
            .unwrap_or_else(|| Reply::Json(page("scroll-1", 0, Vec::new())));
        Self::start(first, replies.into())
    }

    /// Base URL for the API (e.g. `http://127.0.0.1:PORT`).
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }
}

/// A search response page with `_id`s numbered from `first_id`.
pub fn page(scroll_id: &str, first_id: usize, docs: Vec<Value>) -> Value {
    let hits: Vec<Value> = docs
        .into_iter()
        .enumerate()
        .map(|(i, source)| json!({ "_id": format!("doc-{}", first_id + i), "_source": source }))
        .collect();
    json!({ "_scroll_id": scroll_id, "hits": { "hits": hits } })
}

fn record(state: &Shared, method: Method, uri: Uri, headers: HeaderMap, body: String) {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    state.lock().unwrap().requests.push(RecordedRequest {
        method: method.to_string(),
        target,
        headers,
        body,
    });
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

async fn first_page(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Reply {
    record(&state, method, uri, headers, body);
    state
        .lock()
        .unwrap()
        .first
        .take()
        .unwrap_or(Reply::Status(500))
}

async fn next_page(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Reply {
    record(&state, method, uri, headers, body);
    state
        .lock()
        .unwrap()
        .scroll
        .pop_front()
        .unwrap_or_else(|| Reply::Json(page("scroll-1", 0, Vec::new())))
}

async fn clear_scroll(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Reply {
    record(&state, method, uri, headers, body);
    Reply::Json(json!({ "succeeded": true, "num_freed": 1 }))
}
