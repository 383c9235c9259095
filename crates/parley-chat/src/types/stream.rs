use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::message::ToolCall;

/// Kind of a streamed event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    /// Answer text, or the terminal snapshot
    Answer,
    /// Notification that a tool call has started
    ToolCall,
}

/// One event in a chat stream
///
/// Every stream ends with exactly one event whose `done` is `true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamResponse {
    /// Event kind
    pub response_type: ResponseType,
    /// Incremental text, may be empty
    #[serde(default)]
    pub content: String,
    /// Terminal marker
    #[serde(default)]
    pub done: bool,
    /// Snapshot of every tool call accumulated so far
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// Free-form payload; carries `tool_name` and `tool_call_id` for tool-call notifications
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}

impl StreamResponse {
    /// Answer text event
    pub fn answer(content: impl Into<String>, done: bool, tool_calls: Option<Vec<ToolCall>>) -> Self {
        Self {
            response_type: ResponseType::Answer,
            content: content.into(),
            done,
            tool_calls,
            data: None,
        }
    }

    /// Terminal event carrying the final tool-call snapshot
    pub fn terminal(tool_calls: Option<Vec<ToolCall>>) -> Self {
        Self::answer(String::new(), true, tool_calls)
    }

    /// Notification that the model has begun calling `tool_name`
    pub fn tool_call_started(tool_name: impl Into<String>, tool_call_id: impl Into<String>) -> Self {
        let mut data = Map::new();
        data.insert("tool_name".to_owned(), Value::String(tool_name.into()));
        data.insert("tool_call_id".to_owned(), Value::String(tool_call_id.into()));

        Self {
            response_type: ResponseType::ToolCall,
            content: String::new(),
            done: false,
            tool_calls: None,
            data: Some(data),
        }
    }

    /// Tool name from a tool-call notification
    pub fn tool_name(&self) -> Option<&str> {
        self.data_str("tool_name")
    }

    /// Tool call ID from a tool-call notification
    pub fn tool_call_id(&self) -> Option<&str> {
        self.data_str("tool_call_id")
    }

    fn data_str(&self, key: &str) -> Option<&str> {
        self.data.as_ref()?.get(key)?.as_str()
    }
}

/// One streamed fragment of a tool call
///
/// `index` addresses the in-flight call the fragment belongs to; a missing
/// index means index 0. `name` and `arguments` are pieces to append.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolCallDelta {
    pub index: Option<u32>,
    pub id: Option<String>,
    pub tool_type: Option<String>,
    pub name: Option<String>,
    pub arguments: Option<String>,
}
