//! Chat contract and its two backend adapters

pub mod local;
pub mod remote;
pub mod vendor;

use std::future::Future;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::ChatError;
use crate::types::{ChatOptions, ChatResponse, Message, Role, StreamResponse, ToolCall};

/// Receiving half of a chat stream
///
/// Produced by exactly one background worker per call. The final event has
/// `done == true`, after which the channel closes.
pub type ChatStream = mpsc::Receiver<StreamResponse>;

/// Capacity of the stream channel; the worker waits for the consumer
const STREAM_CAPACITY: usize = 1;

/// Contract shared by every chat backend
#[async_trait]
pub trait Chat: Send + Sync {
    /// Perform a single blocking chat call
    async fn chat(
        &self,
        messages: &[Message],
        options: &ChatOptions,
        cancel: &CancellationToken,
    ) -> Result<ChatResponse, ChatError>;

    /// Start a streaming chat call
    ///
    /// Failures before the stream opens are returned here. Failures after
    /// that end the stream with a `done` event carrying whatever was
    /// accumulated, and are only logged.
    async fn chat_stream(
        &self,
        messages: &[Message],
        options: &ChatOptions,
        cancel: &CancellationToken,
    ) -> Result<ChatStream, ChatError>;

    /// Model name sent to the backend
    fn model_name(&self) -> &str;

    /// Caller-side model identifier
    fn model_id(&self) -> &str;
}

/// Producer half of a chat stream that delivers exactly one terminal event
///
/// Every wait on the consumer races the call's cancellation token, so an
/// idle consumer never pins the worker after the caller cancels.
pub(crate) struct EventSink {
    tx: mpsc::Sender<StreamResponse>,
    cancel: CancellationToken,
    finished: bool,
}

impl EventSink {
    pub(crate) fn channel(cancel: CancellationToken) -> (Self, ChatStream) {
        let (tx, rx) = mpsc::channel(STREAM_CAPACITY);
        (
            Self {
                tx,
                cancel,
                finished: false,
            },
            rx,
        )
    }

    /// Deliver an event, waiting for the consumer
    ///
    /// Returns `false` once the stream is finished, the consumer is gone, or
    /// the call was cancelled.
    pub(crate) async fn send(&mut self, event: StreamResponse) -> bool {
        if self.finished {
            return false;
        }

        let permit = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return false,
            permit = self.tx.reserve() => permit,
        };

        let Ok(permit) = permit else {
            self.finished = true;
            return false;
        };

        self.finished = event.done;
        permit.send(event);
        !self.finished
    }

    /// Close the stream, emitting the terminal event unless one was already sent
    ///
    /// After cancellation the terminal event is only delivered if the channel
    /// has room; otherwise the channel just closes.
    pub(crate) async fn finish(self, tool_calls: Option<Vec<ToolCall>>) {
        if self.finished {
            return;
        }

        let permit = tokio::select! {
            biased;
            () = self.cancel.cancelled() => self.tx.try_reserve().ok(),
            permit = self.tx.reserve() => permit.ok(),
        };

        if let Some(permit) = permit {
            permit.send(StreamResponse::terminal(tool_calls));
        }
    }
}

/// Run `fut` unless `cancel` fires first
pub(crate) async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T, ChatError>>,
) -> Result<T, ChatError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(ChatError::Cancelled),
        result = fut => result,
    }
}

/// Reject message lists and options that no backend could accept
pub(crate) fn validate_request(messages: &[Message], options: &ChatOptions) -> Result<(), ChatError> {
    for (i, msg) in messages.iter().enumerate() {
        if msg.role == Role::Tool && msg.tool_call_id.as_deref().is_none_or(str::is_empty) {
            return Err(ChatError::RequestBuild(format!(
                "tool message at position {i} has no tool_call_id"
            )));
        }
    }

    for tool in &options.tools {
        if tool.function.name.trim().is_empty() {
            return Err(ChatError::RequestBuild("tool definition has an empty name".to_owned()));
        }

        let params = &tool.function.parameters;
        if !params.is_null() && !params.is_object() {
            return Err(ChatError::RequestBuild(format!(
                "parameters of tool `{}` must be a JSON Schema object",
                tool.function.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::Tool;

    #[test]
    fn tool_message_requires_call_id() {
        let mut orphan = Message::tool("x", "search", "result");
        orphan.tool_call_id = None;

        let err = validate_request(&[Message::user("q"), orphan], &ChatOptions::default()).unwrap_err();
        assert!(matches!(err, ChatError::RequestBuild(ref m) if m.contains("position 1")));
    }

    #[test]
    fn tool_schema_must_be_object() {
        let options = ChatOptions {
            tools: vec![Tool::function("search", "Search docs", json!(["query"]))],
            ..ChatOptions::default()
        };

        let err = validate_request(&[Message::user("q")], &options).unwrap_err();
        assert!(matches!(err, ChatError::RequestBuild(_)));
    }

    #[test]
    fn well_formed_request_passes() {
        let options = ChatOptions {
            tools: vec![Tool::function(
                "search",
                "Search docs",
                json!({"type": "object", "properties": {"query": {"type": "string"}}}),
            )],
            ..ChatOptions::default()
        };

        let messages = [Message::user("q"), Message::tool("call_1", "search", "hit")];
        assert!(validate_request(&messages, &options).is_ok());
    }

    #[tokio::test]
    async fn sink_emits_single_terminal_event() {
        let (mut sink, mut rx) = EventSink::channel(CancellationToken::new());

        let producer = tokio::spawn(async move {
            assert!(sink.send(StreamResponse::answer("a", false, None)).await);
            assert!(!sink.send(StreamResponse::answer("b", true, None)).await);
            assert!(!sink.send(StreamResponse::answer("c", false, None)).await);
            sink.finish(None).await;
        });

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        producer.await.unwrap();

        let contents: Vec<_> = events.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, ["a", "b"]);
        assert_eq!(events.iter().filter(|e| e.done).count(), 1);
    }

    #[tokio::test]
    async fn finish_sends_terminal_when_none_sent() {
        let (sink, mut rx) = EventSink::channel(CancellationToken::new());
        let calls = vec![ToolCall::function("c1", "f", "{}")];

        tokio::spawn(sink.finish(Some(calls.clone())));

        let event = rx.recv().await.unwrap();
        assert!(event.done);
        assert_eq!(event.tool_calls, Some(calls));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn cancelled_sink_gives_up_on_idle_consumer() {
        let cancel = CancellationToken::new();
        let (mut sink, mut rx) = EventSink::channel(cancel.clone());

        assert!(sink.send(StreamResponse::answer("a", false, None)).await);
        cancel.cancel();

        assert!(!sink.send(StreamResponse::answer("b", false, None)).await);
        sink.finish(None).await;

        let event = rx.recv().await.unwrap();
        assert_eq!(event.content, "a");
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn cancellable_returns_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = cancellable(&cancel, std::future::pending::<Result<(), ChatError>>()).await;
        assert!(matches!(result, Err(ChatError::Cancelled)));
    }
}
