//! Mock OpenAI-compatible backend for integration tests
//!
//! Replies to `/v1/chat/completions` with a scripted response and records
//! every request body and authorization header it receives.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use futures_util::stream::{self, StreamExt};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

/// Scripted reply for the completions endpoint
#[derive(Debug, Clone)]
pub enum Reply {
    /// JSON body with the given status
    Json { status: StatusCode, body: Value },
    /// Raw body with the given status
    Raw { status: StatusCode, body: String },
    /// SSE stream of `data:` payloads, optionally left open after the last one
    Sse { payloads: Vec<String>, hang: bool },
}

impl Reply {
    /// A successful completion with a single assistant message
    pub fn completion(content: &str) -> Self {
        Self::Json {
            status: StatusCode::OK,
            body: json!({
                "id": "chatcmpl-mock",
                "object": "chat.completion",
                "created": 1_700_000_000,
                "model": "mock-model",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": content},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 12, "completion_tokens": 4, "total_tokens": 16}
            }),
        }
    }

    /// An OpenAI-style error envelope
    pub fn error(status: StatusCode, message: &str) -> Self {
        Self::Json {
            status,
            body: json!({"error": {"message": message, "type": "invalid_request_error"}}),
        }
    }

    /// A stream of chunks terminated by `[DONE]`
    pub fn sse(chunks: &[Value]) -> Self {
        let mut payloads: Vec<String> = chunks.iter().map(Value::to_string).collect();
        payloads.push("[DONE]".to_owned());
        Self::Sse { payloads, hang: false }
    }

    /// A stream of chunks that never completes
    pub fn sse_hanging(chunks: &[Value]) -> Self {
        Self::Sse {
            payloads: chunks.iter().map(Value::to_string).collect(),
            hang: true,
        }
    }
}

/// Streaming chunk carrying text
pub fn text_chunk(content: &str) -> Value {
    json!({
        "id": "chatcmpl-mock",
        "object": "chat.completion.chunk",
        "choices": [{"index": 0, "delta": {"content": content}, "finish_reason": null}]
    })
}

/// Streaming chunk carrying one tool-call fragment
pub fn tool_chunk(index: u32, id: Option<&str>, name: Option<&str>, arguments: Option<&str>) -> Value {
    let mut function = serde_json::Map::new();
    if let Some(name) = name {
        function.insert("name".to_owned(), json!(name));
    }
    if let Some(arguments) = arguments {
        function.insert("arguments".to_owned(), json!(arguments));
    }

    let mut call = json!({"index": index, "function": function});
    if let Some(id) = id {
        call["id"] = json!(id);
        call["type"] = json!("function");
    }

    json!({
        "id": "chatcmpl-mock",
        "object": "chat.completion.chunk",
        "choices": [{"index": 0, "delta": {"tool_calls": [call]}, "finish_reason": null}]
    })
}

/// Streaming chunk with an empty delta and a finish reason
pub fn finish_chunk(reason: &str) -> Value {
    json!({
        "id": "chatcmpl-mock",
        "object": "chat.completion.chunk",
        "choices": [{"index": 0, "delta": {}, "finish_reason": reason}]
    })
}

/// Mock OpenAI-compatible server
pub struct MockOpenAi {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    reply: Reply,
    requests: Mutex<Vec<Value>>,
    authorization: Mutex<Vec<Option<String>>>,
}

impl MockOpenAi {
    /// Start the mock server, returning immediately
    pub async fn start(reply: Reply) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            reply,
            requests: Mutex::new(Vec::new()),
            authorization: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/v1/chat/completions", routing::post(handle_chat_completions))
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

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL including `/v1`, as the adapter appends `/chat/completions`
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// Bodies of every request received so far
    pub fn requests(&self) -> Vec<Value> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Body of the most recent request
    pub fn last_request(&self) -> Value {
        self.requests().pop().expect("no request received")
    }

    /// `Authorization` header of the most recent request
    pub fn last_authorization(&self) -> Option<String> {
        self.state.authorization.lock().unwrap().last().cloned().flatten()
    }
}

impl Drop for MockOpenAi {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_chat_completions(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.requests.lock().unwrap().push(body);
    state.authorization.lock().unwrap().push(
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
    );

    match state.reply.clone() {
        Reply::Json { status, body } => (status, Json(body)).into_response(),
        Reply::Raw { status, body } => (status, body).into_response(),
        Reply::Sse { payloads, hang } => {
            let events = stream::iter(payloads).map(|p| Ok::<_, Infallible>(format!("data: {p}\n\n")));
            let body = if hang {
                Body::from_stream(events.chain(stream::pending()))
            } else {
                Body::from_stream(events)
            };

            (StatusCode::OK, [(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
        }
    }
}
