//! Reassembly of streamed tool calls
//!
//! Providers split each tool call across many deltas, addressed by a
//! zero-based index. The accumulator merges the fragments per index and
//! decides when the caller should be told that a call has started: the first
//! fragment, per index, where the name has stopped growing, arguments are
//! flowing, and an ID is known. A name delivered in three or more pieces with
//! no argument bytes in between fires one fragment late; that approximation is
//! accepted.

use std::collections::BTreeMap;

use crate::types::{ToolCall, ToolCallDelta};

/// Notification that a tool call's identity is final
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallStarted {
    /// Index of the call within the response
    pub index: u32,
    /// Fully accumulated function name
    pub tool_name: String,
    /// Provider-assigned call ID
    pub tool_call_id: String,
}

#[derive(Debug, Default)]
struct Entry {
    call: ToolCall,
    /// Accumulated name as of the previous fragment for this index
    last_name: String,
    notified: bool,
}

/// Per-stream accumulation state, keyed by tool-call index
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    entries: BTreeMap<u32, Entry>,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one fragment, returning a start notification if one is due
    pub fn apply(&mut self, delta: &ToolCallDelta) -> Option<ToolCallStarted> {
        let index = delta.index.unwrap_or(0);
        let entry = self.entries.entry(index).or_insert_with(|| Entry {
            call: ToolCall::function("", "", ""),
            ..Entry::default()
        });

        if let Some(id) = delta.id.as_deref().filter(|id| !id.is_empty()) {
            id.clone_into(&mut entry.call.id);
        }
        if let Some(tool_type) = delta.tool_type.as_deref().filter(|t| !t.is_empty()) {
            tool_type.clone_into(&mut entry.call.tool_type);
        }
        if let Some(name) = delta.name.as_deref() {
            entry.call.function.name.push_str(name);
        }

        let args_updated = match delta.arguments.as_deref() {
            Some(args) if !args.is_empty() => {
                entry.call.function.arguments.push_str(args);
                true
            }
            _ => false,
        };

        let name = &entry.call.function.name;
        let mut started = None;
        if !name.is_empty() && *name == entry.last_name && args_updated && !entry.notified && !entry.call.id.is_empty()
        {
            entry.notified = true;
            started = Some(ToolCallStarted {
                index,
                tool_name: name.clone(),
                tool_call_id: entry.call.id.clone(),
            });
        }

        entry.last_name.clone_from(&entry.call.function.name);
        started
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Every accumulated call in ascending index order, or `None` if empty
    pub fn snapshot(&self) -> Option<Vec<ToolCall>> {
        if self.entries.is_empty() {
            return None;
        }

        Some(self.entries.values().map(|e| e.call.clone()).collect())
    }

    /// Consume the accumulator, yielding calls in ascending index order
    pub fn into_tool_calls(self) -> Vec<ToolCall> {
        self.entries.into_values().map(|e| e.call).collect()
    }
}
