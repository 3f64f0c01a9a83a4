//! In-process HTTP server for exercising the client end to end.
//!
//! Every request is recorded (method, path, query, the `Authorization`,
//! `User-Agent` and `X-Trace-Id` headers, body) and answered by a responder
//! closure.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use axum::response::{IntoResponse, Response};
use tokio::task::JoinHandle;

/// A request as seen by the server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub user_agent: Option<String>,
    pub trace_id: Option<String>,
    pub body: String,
}

pub type Responder = Arc<dyn Fn(&RecordedRequest) -> (StatusCode, String) + Send + Sync>;

/// Answer every request with the same status and body.
pub fn reply(status: StatusCode, body: &str) -> Responder {
    let body = body.to_string();
    Arc::new(move |_| (status, body.clone()))
}

/// Answer with a closure of the recorded request.
pub fn respond_with<F>(f: F) -> Responder
where
    F: Fn(&RecordedRequest) -> (StatusCode, String) + Send + Sync + 'static,
{
    Arc::new(f)
}

struct ServerState {
    responder: Responder,
    delay: Duration,
    requests: Mutex<Vec<RecordedRequest>>,
}

pub struct MockServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
    handle: JoinHandle<()>,
}

impl MockServer {
    pub async fn start(responder: Responder) -> Self {
        Self::start_delayed(responder, Duration::ZERO).await
    }

    pub async fn start_delayed(responder: Responder, delay: Duration) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(ServerState {
            responder,
            delay,
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new().fallback(record_and_reply).with_state(state.clone());
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn record_and_reply(State(state): State<Arc<ServerState>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();

    let recorded = RecordedRequest {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        authorization: header(&parts.headers, AUTHORIZATION.as_str()),
        user_agent: header(&parts.headers, USER_AGENT.as_str()),
        trace_id: header(&parts.headers, "x-trace-id"),
        body: String::from_utf8_lossy(&body).into_owned(),
    };
    state.requests.lock().unwrap().push(recorded.clone());

    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }

    let (status, body) = (state.responder)(&recorded);
    (status, [(CONTENT_TYPE, "application/json")], body).into_response()
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
