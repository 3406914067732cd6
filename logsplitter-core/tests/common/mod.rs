//! In-process fake of the LogSplitter REST API
//!
//! Every route answers from a queue of canned replies (the last reply
//! repeats) and every request is recorded, so tests can assert both what the
//! stores did with a response and whether a request was sent at all.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use logsplitter_core::identity::{IdentityProvider, StaticIdentity};
use logsplitter_core::{Config, LogSplitter};
use serde_json::{json, Value};

pub const TEST_TOKEN: &str = "test-token";

#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: String,
    pub delay: Option<Duration>,
}

impl Reply {
    pub fn json(body: Value) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            delay: None,
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: None,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// One request as the backend saw it
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub body: Option<Value>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
}

impl Recorded {
    pub fn query_param(&self, key: &str) -> Option<String> {
        self.query.as_deref()?.split('&').find_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            (k == key).then(|| v.to_string())
        })
    }
}

#[derive(Default)]
struct Inner {
    routes: HashMap<String, VecDeque<Reply>>,
    requests: Vec<Recorded>,
}

#[derive(Clone, Default)]
pub struct FakeBackend {
    inner: Arc<Mutex<Inner>>,
    pub base_url: String,
}

fn route_key(method: &str, path: &str) -> String {
    format!("{} {}", method.to_uppercase(), path)
}

impl FakeBackend {
    /// Bind to an ephemeral port and serve in the background
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let backend = FakeBackend {
            inner: Arc::default(),
            base_url: format!("http://{}", addr),
        };

        let app = Router::new().fallback(handle).with_state(backend.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        backend
    }

    /// Queue a reply for `METHOD path`
    pub fn on(&self, method: &str, path: &str, reply: Reply) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .routes
            .entry(route_key(method, path))
            .or_default()
            .push_back(reply);
    }

    /// Queue a successful envelope carrying `data`
    pub fn ok(&self, method: &str, path: &str, data: Value) {
        self.on(method, path, Reply::json(json!({"success": true, "data": data})));
    }

    /// Queue a failed envelope
    pub fn fail(&self, method: &str, path: &str, status: u16, error: &str) {
        self.on(
            method,
            path,
            Reply::status(status, &json!({"success": false, "error": error}).to_string()),
        );
    }

    pub fn requests(&self, method: &str, path: &str) -> Vec<Recorded> {
        let inner = self.inner.lock().unwrap();
        inner
            .requests
            .iter()
            .filter(|r| r.method == method.to_uppercase() && r.path == path)
            .cloned()
            .collect()
    }

    pub fn hits(&self, method: &str, path: &str) -> usize {
        self.requests(method, path).len()
    }

    pub fn total_hits(&self) -> usize {
        self.inner.lock().unwrap().requests.len()
    }

    fn next_reply(&self, key: &str) -> Option<Reply> {
        let mut inner = self.inner.lock().unwrap();
        let queue = inner.routes.get_mut(key)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

async fn handle(
    State(backend): State<FakeBackend>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    backend.inner.lock().unwrap().requests.push(Recorded {
        method: method.as_str().to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        body: serde_json::from_slice(&body).ok(),
        authorization: header_value(header::AUTHORIZATION),
        content_type: header_value(header::CONTENT_TYPE),
    });

    let Some(reply) = backend.next_reply(&route_key(method.as_str(), uri.path())) else {
        return (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "application/json")],
            json!({"success": false, "error": "Not found"}).to_string(),
        )
            .into_response();
    };

    if let Some(delay) = reply.delay {
        tokio::time::sleep(delay).await;
    }

    (
        StatusCode::from_u16(reply.status).unwrap(),
        [(header::CONTENT_TYPE, "application/json")],
        reply.body,
    )
        .into_response()
}

// ============================================
// Client helpers
// ============================================

pub fn config(backend: &FakeBackend) -> Config {
    let mut config = Config::default();
    config.api.base_url = backend.base_url.clone();
    config
}

/// Connect as a signed-in user. Queue permissions first.
pub async fn connect(backend: &FakeBackend) -> LogSplitter {
    let identity = Arc::new(StaticIdentity::new(Some(TEST_TOKEN.to_string())).with_user("user_1", None));
    connect_with(backend, identity).await
}

pub async fn connect_with(backend: &FakeBackend, identity: Arc<dyn IdentityProvider>) -> LogSplitter {
    LogSplitter::connect(&config(backend), identity).await.unwrap()
}

/// Backend with permissions queued and a connected client
pub async fn signed_in(permissions: Value) -> (FakeBackend, LogSplitter) {
    let backend = FakeBackend::start().await;
    backend.ok("GET", "/api/users/permissions", permissions);
    let client = connect(&backend).await;
    (backend, client)
}

// ============================================
// Fixtures
// ============================================

pub fn permissions(features: &[&str], monthly_uploads: Option<(i64, i64)>) -> Value {
    let features: serde_json::Map<String, Value> = features.iter().map(|f| (f.to_string(), json!(true))).collect();
    let mut limits = serde_json::Map::new();
    if let Some((max, used)) = monthly_uploads {
        let remaining = if max < 0 { 0 } else { (max - used).max(0) };
        limits.insert(
            "monthly-uploads".to_string(),
            json!({"max": max, "used": used, "remaining": remaining}),
        );
    }
    json!({"features": features, "limits": limits, "plan": "pro"})
}

pub fn pagination(total: u64, limit: u32, offset: u32) -> Value {
    json!({
        "total": total,
        "limit": limit,
        "offset": offset,
        "hasMore": (offset as u64 + limit as u64) < total,
    })
}

pub fn upload(id: &str) -> Value {
    json!({
        "id": id,
        "filename": format!("{}.log", id),
        "totalLines": 120,
        "levelCounts": {"ERROR": 3, "WARN": 5, "INFO": 100, "DEBUG": 12, "UNKNOWN": 0},
        "patternsFound": 7,
        "createdAt": "2024-05-01T10:00:00Z",
    })
}

pub fn uploads_page(ids: &[&str], total: u64, limit: u32, offset: u32) -> Value {
    json!({
        "uploads": ids.iter().map(|id| upload(id)).collect::<Vec<_>>(),
        "pagination": pagination(total, limit, offset),
    })
}

pub fn group(id: &str, level: &str, message: &str) -> Value {
    json!({
        "id": id,
        "fingerprint": format!("fp-{}", id),
        "level": level,
        "messageSample": message,
        "count": 4,
        "firstSeenAt": "2024-05-01T10:00:00Z",
        "lastSeenAt": "2024-05-01T11:00:00Z",
    })
}

pub fn search_result(id: &str, message: &str) -> Value {
    json!({
        "id": id,
        "fingerprint": format!("fp-{}", id),
        "level": "ERROR",
        "messageSample": message,
        "count": 2,
        "firstSeenAt": "2024-05-01T10:00:00Z",
        "lastSeenAt": "2024-05-01T11:00:00Z",
        "uploadId": "up1",
        "filename": "app.log",
    })
}

pub fn webhook(id: &str, active: bool) -> Value {
    json!({
        "id": id,
        "url": format!("https://hooks.example.com/{}", id),
        "events": ["error.new"],
        "isActive": active,
        "createdAt": "2024-05-01T10:00:00Z",
        "updatedAt": "2024-05-01T10:00:00Z",
    })
}

pub fn delivery(id: &str) -> Value {
    json!({
        "id": id,
        "eventType": "error.new",
        "payload": {"uploadId": "up1"},
        "responseStatus": 200,
        "attemptCount": 1,
        "status": "success",
        "createdAt": "2024-05-01T10:00:00Z",
        "deliveredAt": "2024-05-01T10:00:01Z",
    })
}
