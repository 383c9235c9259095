//! Local runtime chat adapter

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use parley_config::ChatConfig;
use tokio_util::sync::CancellationToken;

use super::{Chat, ChatStream, EventSink, cancellable, validate_request};
use crate::convert::ollama::usage_from_counts;
use crate::error::ChatError;
use crate::protocol::ollama::OllamaChatRequest;
use crate::runtime::{LocalRuntime, RuntimeStream};
use crate::types::{ChatOptions, ChatResponse, Message, StreamResponse};

/// Chat backend running models on a local runtime
pub struct LocalChat {
    model_name: String,
    model_id: String,
    runtime: Arc<dyn LocalRuntime>,
}

impl LocalChat {
    /// Create from chat configuration and an injected runtime
    pub fn new(config: &ChatConfig, runtime: Arc<dyn LocalRuntime>) -> Self {
        Self {
            model_name: config.model_name.clone(),
            model_id: config.model_id.clone(),
            runtime,
        }
    }

    /// Build the runtime request
    pub fn build_request(
        &self,
        messages: &[Message],
        options: &ChatOptions,
        stream: bool,
    ) -> Result<OllamaChatRequest, ChatError> {
        validate_request(messages, options)?;

        Ok(OllamaChatRequest {
            model: self.model_name.clone(),
            messages: messages.iter().map(Into::into).collect(),
            stream,
            options: options.into(),
            think: options.thinking,
        })
    }

    /// Validate, materialize the model, and open the runtime stream
    async fn start(
        &self,
        messages: &[Message],
        options: &ChatOptions,
        stream: bool,
        cancel: &CancellationToken,
    ) -> Result<RuntimeStream, ChatError> {
        let request = self.build_request(messages, options, stream)?;

        tracing::info!(model = %self.model_name, "ensuring model is available");
        self.runtime.ensure_model_available(&self.model_name, cancel).await?;

        tracing::info!(model = %self.model_name, stream, "sending local chat request");
        self.runtime.chat(&request, cancel).await
    }
}

#[async_trait]
impl Chat for LocalChat {
    async fn chat(
        &self,
        messages: &[Message],
        options: &ChatOptions,
        cancel: &CancellationToken,
    ) -> Result<ChatResponse, ChatError> {
        let mut records = self.start(messages, options, false, cancel).await?;

        let collect = async {
            let mut response = ChatResponse::default();

            while let Some(record) = records.next().await {
                let record = record?;
                if !record.message.content.is_empty() {
                    response.content = record.message.content;
                }
                if record.done {
                    response.finish_reason = record.done_reason.unwrap_or_default();
                    response.usage = usage_from_counts(record.prompt_eval_count, record.eval_count);
                    return Ok(response);
                }
            }

            Err(ChatError::MalformedResponse(
                "runtime stream ended before completion".to_owned(),
            ))
        };

        cancellable(cancel, collect).await
    }

    async fn chat_stream(
        &self,
        messages: &[Message],
        options: &ChatOptions,
        cancel: &CancellationToken,
    ) -> Result<ChatStream, ChatError> {
        let records = self.start(messages, options, true, cancel).await?;

        let (sink, stream) = EventSink::channel(cancel.clone());
        tokio::spawn(pump_records(records, sink, cancel.clone(), self.model_name.clone()));

        Ok(stream)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Forward runtime records as answer events until the runtime reports completion
async fn pump_records(mut records: RuntimeStream, mut sink: EventSink, cancel: CancellationToken, model: String) {
    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!(model = %model, "local stream cancelled by caller");
                break;
            }
            next = records.next() => next,
        };

        let record = match next {
            None => break,
            Some(Err(e)) => {
                tracing::error!(model = %model, error = %e, "local stream failed");
                break;
            }
            Some(Ok(record)) => record,
        };

        if !sink.send(StreamResponse::answer(record.message.content, record.done, None)).await {
            break;
        }
    }

    sink.finish(None).await;
}
