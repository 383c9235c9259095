//! Unified chat interface for Parley
//!
//! Issues chat-completion requests against a local Ollama runtime or a remote
//! OpenAI-compatible provider through one contract, and reassembles streamed
//! tool-call fragments into complete invocations.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod accumulator;
pub mod convert;
pub mod error;
pub mod protocol;
pub mod provider;
pub mod runtime;
pub mod selector;
pub mod types;

pub use accumulator::{ToolCallAccumulator, ToolCallStarted};
pub use error::{ChatError, Stage};
pub use provider::local::LocalChat;
pub use provider::remote::RemoteChat;
pub use provider::vendor::Vendor;
pub use provider::{Chat, ChatStream};
pub use runtime::{LocalRuntime, OllamaRuntime};
pub use selector::{ChatBackend, ModelSource};
pub use types::{
    ChatOptions, ChatResponse, FunctionCall, FunctionDef, Message, ResponseType, Role, StreamResponse, Tool, ToolCall,
    ToolChoice, Usage,
};
