//! Mock Ollama runtime for integration tests
//!
//! Serves `/api/tags`, `/api/pull`, and `/api/chat`. Chat replies stream one
//! NDJSON record per word followed by a `done` record with token counts.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Prompt tokens reported on the final record
pub const PROMPT_EVAL_COUNT: u32 = 10;
/// Total evaluated tokens reported on the final record
pub const EVAL_COUNT: u32 = 25;

/// Builder for a [`MockOllama`]
#[derive(Default)]
pub struct MockOllamaBuilder {
    installed: Vec<String>,
    reply: Option<String>,
    failing_pull: bool,
}

impl MockOllamaBuilder {
    /// Mark a model tag as already installed
    pub fn installed(mut self, name: &str) -> Self {
        self.installed.push(name.to_owned());
        self
    }

    /// Assistant reply text
    pub fn reply(mut self, text: &str) -> Self {
        self.reply = Some(text.to_owned());
        self
    }

    /// Make every pull fail
    pub fn failing_pull(mut self) -> Self {
        self.failing_pull = true;
        self
    }

    pub async fn start(self) -> anyhow::Result<MockOllama> {
        let state = Arc::new(MockState {
            installed: Mutex::new(self.installed),
            reply: self.reply.unwrap_or_else(|| "Hello from mock runtime".to_owned()),
            failing_pull: self.failing_pull,
            pulls: AtomicU32::new(0),
            chats: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/api/tags", routing::get(handle_tags))
            .route("/api/pull", routing::post(handle_pull))
            .route("/api/chat", routing::post(handle_chat))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(MockOllama { addr, shutdown, state })
    }
}

/// Mock Ollama server
pub struct MockOllama {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    installed: Mutex<Vec<String>>,
    reply: String,
    failing_pull: bool,
    pulls: AtomicU32,
    chats: Mutex<Vec<Value>>,
}

impl MockOllama {
    pub fn builder() -> MockOllamaBuilder {
        MockOllamaBuilder::default()
    }

    /// Base URL of the runtime API
    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr)).unwrap()
    }

    /// Number of pull requests received
    pub fn pull_count(&self) -> u32 {
        self.state.pulls.load(Ordering::Relaxed)
    }

    /// Bodies of every chat request received so far
    pub fn chat_requests(&self) -> Vec<Value> {
        self.state.chats.lock().unwrap().clone()
    }
}

impl Drop for MockOllama {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_tags(State(state): State<Arc<MockState>>) -> impl IntoResponse {
    let models: Vec<Value> = state
        .installed
        .lock()
        .unwrap()
        .iter()
        .map(|name| json!({"name": name, "size": 4_000_000_000_u64}))
        .collect();

    Json(json!({"models": models}))
}

async fn handle_pull(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.pulls.fetch_add(1, Ordering::Relaxed);

    if state.failing_pull {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "pull model manifest: file does not exist"})),
        )
            .into_response();
    }

    let model = body["model"].as_str().unwrap_or_default().to_owned();
    state.installed.lock().unwrap().push(model);

    Json(json!({"status": "success"})).into_response()
}

async fn handle_chat(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    let model = body["model"].as_str().unwrap_or_default().to_owned();
    let stream = body["stream"].as_bool().unwrap_or(true);
    state.chats.lock().unwrap().push(body);

    let done = |content: &str| {
        json!({
            "model": model,
            "message": {"role": "assistant", "content": content},
            "done": true,
            "done_reason": "stop",
            "prompt_eval_count": PROMPT_EVAL_COUNT,
            "eval_count": EVAL_COUNT
        })
    };

    if !stream {
        return Json(done(&state.reply)).into_response();
    }

    let mut body = String::new();
    for (i, word) in state.reply.split_whitespace().enumerate() {
        let piece = if i == 0 { word.to_owned() } else { format!(" {word}") };
        let record = json!({
            "model": model,
            "message": {"role": "assistant", "content": piece},
            "done": false
        });
        body.push_str(&record.to_string());
        body.push('\n');
    }
    body.push_str(&done("").to_string());
    body.push('\n');

    (StatusCode::OK, [(header::CONTENT_TYPE, "application/x-ndjson")], body).into_response()
}
