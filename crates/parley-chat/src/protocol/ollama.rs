//! Ollama HTTP API wire format

use serde::{Deserialize, Serialize};

/// Body of `POST /api/chat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaChatRequest {
    /// Model name
    pub model: String,
    /// Conversation messages
    pub messages: Vec<OllamaMessage>,
    /// Stream NDJSON records instead of returning one
    pub stream: bool,
    /// Runtime sampling options
    #[serde(default, skip_serializing_if = "OllamaOptions::is_empty")]
    pub options: OllamaOptions,
    /// Reasoning toggle for thinking-capable models
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub think: Option<bool>,
}

/// Message in Ollama's chat format
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OllamaMessage {
    /// Message role
    pub role: String,
    /// Text content
    #[serde(default)]
    pub content: String,
}

/// Runtime option bag; unset entries are omitted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OllamaOptions {
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Nucleus sampling threshold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Maximum tokens to predict
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<u32>,
    /// Random seed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl OllamaOptions {
    pub const fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.top_p.is_none() && self.num_predict.is_none() && self.seed.is_none()
    }
}

/// One record of a `/api/chat` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OllamaChatResponse {
    /// Model that produced the record
    #[serde(default)]
    pub model: String,
    /// Message fragment (streaming) or full message
    #[serde(default)]
    pub message: OllamaMessage,
    /// Whether generation has finished
    #[serde(default)]
    pub done: bool,
    /// Why generation finished
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_reason: Option<String>,
    /// Prompt tokens evaluated
    #[serde(default)]
    pub prompt_eval_count: u32,
    /// Tokens evaluated in total
    #[serde(default)]
    pub eval_count: u32,
    /// Runtime-reported failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response of `GET /api/tags`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OllamaTagsResponse {
    /// Locally available models
    #[serde(default)]
    pub models: Vec<OllamaModelTag>,
}

/// One locally available model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaModelTag {
    /// Model name including tag, e.g. `llama3:latest`
    pub name: String,
}

/// Body of `POST /api/pull`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaPullRequest {
    /// Model to pull
    pub model: String,
    /// Report progress as NDJSON
    pub stream: bool,
}

/// Final status of `POST /api/pull`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OllamaPullResponse {
    /// Status text, `success` when done
    #[serde(default)]
    pub status: String,
    /// Failure message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Error body returned with non-success statuses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaErrorResponse {
    /// Failure message
    pub error: String,
}
