//! In-process stand-in for the Agent Shaker server: generic JSON resources
//! under `/api`, `/health`, and a `/ws` push endpoint driven from the test.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use shaker_core::CoreConfig;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Timestamp the fake server stamps on status updates.
pub const ECHO_TIME: &str = "2024-06-01T12:00:00Z";

#[derive(Debug, Clone)]
pub struct Hit {
    pub method: &'static str,
    pub path: String,
    pub query: HashMap<String, String>,
}

#[derive(Debug, Clone)]
enum PushCommand {
    Text(String),
    Close,
}

pub struct BackendState {
    resources: Mutex<HashMap<String, Vec<Value>>>,
    hits: Mutex<Vec<Hit>>,
    fail_next: Mutex<Option<(StatusCode, String)>>,
    next_id: AtomicU64,
    healthy: AtomicBool,
    push: broadcast::Sender<PushCommand>,
    ws_opened: AtomicUsize,
    ws_current: AtomicUsize,
    ws_max: AtomicUsize,
    ws_projects: Mutex<Vec<String>>,
    ws_received: Mutex<Vec<String>>,
}

pub struct FakeBackend {
    pub addr: SocketAddr,
    state: Arc<BackendState>,
    server: JoinHandle<()>,
}

impl FakeBackend {
    pub async fn spawn() -> Self {
        let (push, _) = broadcast::channel(64);
        let state = Arc::new(BackendState {
            resources: Mutex::new(HashMap::new()),
            hits: Mutex::new(Vec::new()),
            fail_next: Mutex::new(None),
            next_id: AtomicU64::new(1),
            healthy: AtomicBool::new(true),
            push,
            ws_opened: AtomicUsize::new(0),
            ws_current: AtomicUsize::new(0),
            ws_max: AtomicUsize::new(0),
            ws_projects: Mutex::new(Vec::new()),
            ws_received: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/health", get(health))
            .route("/ws", get(ws_handler))
            .route("/api/:resource", get(list).post(create))
            .route("/api/:resource/:id", get(fetch).put(update).delete(remove))
            .route("/api/:resource/:id/:nested", get(nested_list).put(update_status))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            server,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Short reconnect delay so reconnect tests finish quickly.
    pub fn config(&self) -> CoreConfig {
        CoreConfig::new(self.url()).with_reconnect_delay(Duration::from_millis(150))
    }

    pub fn seed(&self, resource: &str, items: Vec<Value>) {
        self.state
            .resources
            .lock()
            .insert(resource.to_string(), items);
    }

    pub fn stored(&self, resource: &str) -> Vec<Value> {
        self.state
            .resources
            .lock()
            .get(resource)
            .cloned()
            .unwrap_or_default()
    }

    /// The next `/api` request fails with this status and body.
    pub fn fail_next(&self, status: u16, body: &str) {
        let status = StatusCode::from_u16(status).unwrap();
        *self.state.fail_next.lock() = Some((status, body.to_string()));
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.state.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn hits(&self) -> Vec<Hit> {
        self.state.hits.lock().clone()
    }

    pub fn clear_hits(&self) {
        self.state.hits.lock().clear();
    }

    /// Count of `GET /api/<resource>` list reads whose query has `key=value`.
    pub fn list_reads(&self, resource: &str, key: &str, value: &str) -> usize {
        self.hits()
            .iter()
            .filter(|hit| {
                hit.method == "GET"
                    && hit.path == resource
                    && hit.query.get(key).map(String::as_str) == Some(value)
            })
            .count()
    }

    pub fn push(&self, event: Value) {
        let _ = self.state.push.send(PushCommand::Text(event.to_string()));
    }

    pub fn push_raw(&self, text: &str) {
        let _ = self.state.push.send(PushCommand::Text(text.to_string()));
    }

    /// Server-initiated close of every open socket.
    pub fn kick(&self) {
        let _ = self.state.push.send(PushCommand::Close);
    }

    pub fn ws_opened(&self) -> usize {
        self.state.ws_opened.load(Ordering::SeqCst)
    }

    pub fn ws_current(&self) -> usize {
        self.state.ws_current.load(Ordering::SeqCst)
    }

    pub fn ws_max(&self) -> usize {
        self.state.ws_max.load(Ordering::SeqCst)
    }

    pub fn ws_projects(&self) -> Vec<String> {
        self.state.ws_projects.lock().clone()
    }

    pub fn ws_received(&self) -> Vec<String> {
        self.state.ws_received.lock().clone()
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// Polls `check` until it holds, panicking after five seconds.
pub async fn eventually<F: Fn() -> bool>(what: &str, check: F) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !check() {
        if Instant::now() > deadline {
            panic!("timed out waiting for {}", what);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

type Shared = State<Arc<BackendState>>;

impl BackendState {
    fn record(&self, method: &'static str, path: String, query: HashMap<String, String>) {
        self.hits.lock().push(Hit {
            method,
            path,
            query,
        });
    }

    fn injected_failure(&self) -> Option<Response> {
        self.fail_next
            .lock()
            .take()
            .map(|(status, body)| (status, body).into_response())
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not found\n").into_response()
}

async fn health(State(state): Shared) -> StatusCode {
    if state.healthy.load(Ordering::SeqCst) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn list(
    State(state): Shared,
    Path(resource): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.record("GET", resource.clone(), query.clone());
    if let Some(failure) = state.injected_failure() {
        return failure;
    }

    let items: Vec<Value> = state
        .resources
        .lock()
        .get(&resource)
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .filter(|item| {
            query.iter().all(|(key, value)| match key.as_str() {
                "project_id" | "agent_id" | "status" => {
                    item.get(key).and_then(Value::as_str) == Some(value.as_str())
                }
                _ => true,
            })
        })
        .collect();

    if items.is_empty() {
        // The real server encodes an empty slice as null
        return Json(Value::Null).into_response();
    }
    Json(items).into_response()
}

async fn create(
    State(state): Shared,
    Path(resource): Path<String>,
    Json(mut body): Json<Value>,
) -> Response {
    state.record("POST", resource.clone(), HashMap::new());
    if let Some(failure) = state.injected_failure() {
        return failure;
    }

    if body.get("id").is_none() {
        let id = format!("{}-{}", resource, state.next_id.fetch_add(1, Ordering::SeqCst));
        body["id"] = json!(id);
    }
    state
        .resources
        .lock()
        .entry(resource)
        .or_default()
        .push(body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn fetch(State(state): Shared, Path((resource, id)): Path<(String, String)>) -> Response {
    state.record("GET", format!("{}/{}", resource, id), HashMap::new());
    if let Some(failure) = state.injected_failure() {
        return failure;
    }

    let resources = state.resources.lock();
    match resources
        .get(&resource)
        .and_then(|items| items.iter().find(|item| item["id"] == id.as_str()))
    {
        Some(item) => Json(item.clone()).into_response(),
        None => not_found(),
    }
}

async fn update(
    State(state): Shared,
    Path((resource, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    state.record("PUT", format!("{}/{}", resource, id), HashMap::new());
    if let Some(failure) = state.injected_failure() {
        return failure;
    }

    let mut resources = state.resources.lock();
    let Some(item) = resources
        .get_mut(&resource)
        .and_then(|items| items.iter_mut().find(|item| item["id"] == id.as_str()))
    else {
        return not_found();
    };
    if let (Some(target), Some(patch)) = (item.as_object_mut(), body.as_object()) {
        for (key, value) in patch {
            target.insert(key.clone(), value.clone());
        }
    }
    Json(item.clone()).into_response()
}

/// `GET /<resource>/{id}/<nested>`: items of `nested` whose `<resource>_id`
/// (singular) matches, e.g. `/tasks/t1/documentation` reads `task_id == t1`.
async fn nested_list(
    State(state): Shared,
    Path((resource, id, nested)): Path<(String, String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.record("GET", format!("{}/{}/{}", resource, id, nested), query.clone());
    if let Some(failure) = state.injected_failure() {
        return failure;
    }

    let key = format!("{}_id", resource.trim_end_matches('s'));
    let limit = query
        .get("limit")
        .and_then(|limit| limit.parse::<usize>().ok())
        .unwrap_or(usize::MAX);
    let items: Vec<Value> = state
        .resources
        .lock()
        .get(&nested)
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .filter(|item| item.get(&key).and_then(Value::as_str) == Some(id.as_str()))
        .take(limit)
        .collect();

    if items.is_empty() {
        return Json(Value::Null).into_response();
    }
    Json(items).into_response()
}

async fn update_status(
    State(state): Shared,
    Path((resource, id, nested)): Path<(String, String, String)>,
    Json(body): Json<Value>,
) -> Response {
    state.record("PUT", format!("{}/{}/{}", resource, id, nested), HashMap::new());
    if nested != "status" {
        return not_found();
    }
    if let Some(failure) = state.injected_failure() {
        return failure;
    }

    let mut resources = state.resources.lock();
    let Some(item) = resources
        .get_mut(&resource)
        .and_then(|items| items.iter_mut().find(|item| item["id"] == id.as_str()))
    else {
        return not_found();
    };
    item["status"] = body["status"].clone();
    let stamp = if resource == "agents" { "last_seen" } else { "updated_at" };
    item[stamp] = json!(ECHO_TIME);
    Json(item.clone()).into_response()
}

async fn remove(State(state): Shared, Path((resource, id)): Path<(String, String)>) -> Response {
    state.record("DELETE", format!("{}/{}", resource, id), HashMap::new());
    if let Some(failure) = state.injected_failure() {
        return failure;
    }

    let mut resources = state.resources.lock();
    let Some(items) = resources.get_mut(&resource) else {
        return not_found();
    };
    let before = items.len();
    items.retain(|item| item["id"] != id.as_str());
    if items.len() == before {
        return not_found();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): Shared,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let project = query.get("project_id").cloned().unwrap_or_default();
    ws.on_upgrade(move |socket| handle_socket(socket, state, project))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<BackendState>, project: String) {
    let mut commands = state.push.subscribe();
    state.ws_projects.lock().push(project);
    state.ws_opened.fetch_add(1, Ordering::SeqCst);
    let current = state.ws_current.fetch_add(1, Ordering::SeqCst) + 1;
    state.ws_max.fetch_max(current, Ordering::SeqCst);

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Ok(PushCommand::Text(text)) => {
                    if socket.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Ok(PushCommand::Close) => {
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => state.ws_received.lock().push(text),
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    state.ws_current.fetch_sub(1, Ordering::SeqCst);
}
