//! Conversion between chat types and the OpenAI-compatible wire format

use serde_json::Value;

use crate::error::ChatError;
use crate::protocol::openai::{
    OpenAiFunction, OpenAiFunctionCall, OpenAiMessage, OpenAiResponse, OpenAiStreamToolCall, OpenAiTool,
    OpenAiToolCall, OpenAiUsage,
};
use crate::types::{ChatResponse, FunctionCall, Message, Role, Tool, ToolCall, ToolCallDelta, ToolChoice, Usage};

// -- Outbound: chat types -> wire --

impl From<&Message> for OpenAiMessage {
    fn from(msg: &Message) -> Self {
        let is_tool = msg.role == Role::Tool;

        Self {
            role: msg.role.as_str().to_owned(),
            // assistant turns that only call tools are sent without content
            content: (!msg.content.is_empty()).then(|| msg.content.clone()),
            name: if is_tool { msg.name.clone() } else { None },
            tool_calls: (!msg.tool_calls.is_empty()).then(|| msg.tool_calls.iter().map(Into::into).collect()),
            tool_call_id: if is_tool { msg.tool_call_id.clone() } else { None },
        }
    }
}

impl From<&ToolCall> for OpenAiToolCall {
    fn from(tc: &ToolCall) -> Self {
        Self {
            id: tc.id.clone(),
            tool_type: tc.tool_type.clone(),
            function: OpenAiFunctionCall {
                name: tc.function.name.clone(),
                arguments: tc.function.arguments.clone(),
            },
        }
    }
}

impl From<&Tool> for OpenAiTool {
    fn from(tool: &Tool) -> Self {
        Self {
            tool_type: tool.tool_type.clone(),
            function: OpenAiFunction {
                name: tool.function.name.clone(),
                description: tool.function.description.clone(),
                parameters: (!tool.function.parameters.is_null()).then(|| tool.function.parameters.clone()),
            },
        }
    }
}

/// Encode a tool choice as the `tool_choice` JSON value
///
/// Modes pass through as strings; a function name becomes a named-tool object.
pub fn tool_choice_value(choice: &ToolChoice) -> Value {
    match choice {
        ToolChoice::Auto | ToolChoice::Required | ToolChoice::None => Value::String(choice.to_string()),
        ToolChoice::Function(name) => serde_json::json!({
            "type": "function",
            "function": { "name": name }
        }),
    }
}

// -- Inbound: wire -> chat types --

impl From<OpenAiMessage> for Message {
    fn from(msg: OpenAiMessage) -> Self {
        Self {
            role: Role::from_wire(&msg.role),
            content: msg.content.unwrap_or_default(),
            name: msg.name,
            tool_call_id: msg.tool_call_id,
            tool_calls: msg
                .tool_calls
                .map(|calls| calls.into_iter().map(Into::into).collect())
                .unwrap_or_default(),
        }
    }
}

impl From<OpenAiToolCall> for ToolCall {
    fn from(tc: OpenAiToolCall) -> Self {
        Self {
            id: tc.id,
            tool_type: tc.tool_type,
            function: FunctionCall {
                name: tc.function.name,
                arguments: tc.function.arguments,
            },
        }
    }
}

impl From<OpenAiUsage> for Usage {
    fn from(usage: OpenAiUsage) -> Self {
        Self {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }
    }
}

impl From<&OpenAiStreamToolCall> for ToolCallDelta {
    fn from(tc: &OpenAiStreamToolCall) -> Self {
        let (name, arguments) = tc
            .function
            .as_ref()
            .map_or((None, None), |f| (f.name.clone(), f.arguments.clone()));

        Self {
            index: tc.index,
            id: tc.id.clone(),
            tool_type: tc.tool_type.clone(),
            name,
            arguments,
        }
    }
}

impl TryFrom<OpenAiResponse> for ChatResponse {
    type Error = ChatError;

    /// Convert the first choice; zero choices is an `EmptyResponse`
    fn try_from(resp: OpenAiResponse) -> Result<Self, Self::Error> {
        let usage = resp.usage.map(Usage::from).unwrap_or_default();
        let choice = resp.choices.into_iter().next().ok_or(ChatError::EmptyResponse)?;

        Ok(Self {
            content: choice.message.content.unwrap_or_default(),
            finish_reason: choice.finish_reason.unwrap_or_default(),
            usage,
            tool_calls: choice
                .message
                .tool_calls
                .map(|calls| calls.into_iter().map(Into::into).collect())
                .unwrap_or_default(),
        })
    }
}
