//! Remote OpenAI-compatible chat adapter

use std::fmt::Display;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures_util::{Stream, StreamExt};
use parley_config::{ChatConfig, DEFAULT_REMOTE_BASE_URL};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use super::vendor::Vendor;
use super::{Chat, ChatStream, EventSink, cancellable, validate_request};
use crate::accumulator::ToolCallAccumulator;
use crate::convert::openai::tool_choice_value;
use crate::error::{ChatError, Stage};
use crate::protocol::openai::{ChatTemplateKwargs, OpenAiErrorResponse, OpenAiRequest, OpenAiResponse, OpenAiStreamChunk};
use crate::types::{ChatOptions, ChatResponse, Message, StreamResponse, ToolCall, ToolCallDelta};

/// Chat backend for hosted OpenAI-compatible APIs
pub struct RemoteChat {
    model_name: String,
    model_id: String,
    base_url: String,
    api_key: Option<SecretString>,
    client: Client,
    vendor: Vendor,
}

impl RemoteChat {
    /// Create from chat configuration
    pub fn new(config: &ChatConfig) -> Self {
        let base_url = config.base_url_str().unwrap_or(DEFAULT_REMOTE_BASE_URL);
        Self::with_vendor(config, Vendor::detect(&config.model_name, base_url))
    }

    /// Create with an explicit vendor family instead of detecting one
    ///
    /// Useful for gateways that proxy a vendor under a different endpoint.
    pub fn with_vendor(config: &ChatConfig, vendor: Vendor) -> Self {
        let base_url = config.base_url_str().unwrap_or(DEFAULT_REMOTE_BASE_URL).to_owned();

        Self {
            model_name: config.model_name.clone(),
            model_id: config.model_id.clone(),
            base_url,
            api_key: config.api_key.clone(),
            client: Client::new(),
            vendor,
        }
    }

    /// Vendor family detected for this model
    pub const fn vendor(&self) -> Vendor {
        self.vendor
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Build the wire request, applying vendor-specific shaping
    pub fn build_request(
        &self,
        messages: &[Message],
        options: &ChatOptions,
        stream: bool,
    ) -> Result<OpenAiRequest, ChatError> {
        validate_request(messages, options)?;

        let tools = (!options.tools.is_empty()).then(|| options.tools.iter().map(Into::into).collect());

        let tool_choice = match &options.tool_choice {
            Some(_) if !self.vendor.supports_tool_choice() => {
                tracing::debug!(model = %self.model_name, "skipping tool_choice for deepseek model");
                None
            }
            Some(choice) => Some(tool_choice_value(choice)),
            None => None,
        };

        Ok(OpenAiRequest {
            model: self.model_name.clone(),
            messages: messages.iter().map(Into::into).collect(),
            stream,
            temperature: options.temperature(),
            top_p: options.top_p(),
            seed: options.seed(),
            max_tokens: options.max_tokens(),
            max_completion_tokens: options.max_completion_tokens(),
            frequency_penalty: options.frequency_penalty(),
            presence_penalty: options.presence_penalty(),
            tools,
            tool_choice,
            chat_template_kwargs: Some(ChatTemplateKwargs {
                enable_thinking: options.thinking.unwrap_or(false),
            }),
            enable_thinking: (self.vendor.forces_thinking_off() && !stream).then_some(false),
            extensions: passthrough_extensions(&options.extensions),
        })
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key.expose_secret()),
            None => builder,
        }
    }

    /// Send through the regular JSON request path
    async fn send_json(&self, request: &OpenAiRequest) -> Result<ChatResponse, ChatError> {
        let response = self
            .authorized(self.client.post(self.completions_url()).json(request))
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        if !response.status().is_success() {
            return Err(provider_error(response).await);
        }

        decode_completion(response).await
    }

    /// Send a pre-serialized body with hand-set headers
    ///
    /// DashScope only honours `enable_thinking` on this path, and any status
    /// other than 200 is treated as a failure.
    async fn send_raw(&self, request: &OpenAiRequest) -> Result<ChatResponse, ChatError> {
        let body = serde_json::to_vec(request)
            .map_err(|e| ChatError::RequestBuild(format!("failed to serialize request: {e}")))?;

        let mut builder = self
            .client
            .post(self.completions_url())
            .header(CONTENT_TYPE, "application/json")
            .body(body);

        if let Some(key) = &self.api_key {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", key.expose_secret()));
        }

        let response = builder.send().await.map_err(|e| self.send_error(e))?;

        if response.status() != StatusCode::OK {
            return Err(provider_error(response).await);
        }

        decode_completion(response).await
    }

    fn send_error(&self, err: reqwest::Error) -> ChatError {
        tracing::error!(model = %self.model_name, error = %err, "upstream request failed");
        let stage = if err.is_builder() { Stage::Build } else { Stage::Send };
        ChatError::transport(stage, err)
    }
}

#[async_trait]
impl Chat for RemoteChat {
    async fn chat(
        &self,
        messages: &[Message],
        options: &ChatOptions,
        cancel: &CancellationToken,
    ) -> Result<ChatResponse, ChatError> {
        let request = self.build_request(messages, options, false)?;

        tracing::info!(model = %self.model_name, vendor = ?self.vendor, "sending chat request");

        if self.vendor.forces_thinking_off() {
            cancellable(cancel, self.send_raw(&request)).await
        } else {
            cancellable(cancel, self.send_json(&request)).await
        }
    }

    async fn chat_stream(
        &self,
        messages: &[Message],
        options: &ChatOptions,
        cancel: &CancellationToken,
    ) -> Result<ChatStream, ChatError> {
        let request = self.build_request(messages, options, true)?;

        tracing::info!(model = %self.model_name, vendor = ?self.vendor, "sending streaming chat request");

        let builder = self.authorized(self.client.post(self.completions_url()).json(&request));
        let response = cancellable(cancel, async { builder.send().await.map_err(|e| self.send_error(e)) }).await?;

        if !response.status().is_success() {
            return Err(provider_error(response).await);
        }

        let payloads = response
            .bytes_stream()
            .eventsource()
            .map(|event| event.map(|e| e.data));

        let (sink, stream) = EventSink::channel(cancel.clone());
        tokio::spawn(pump_stream(payloads, sink, cancel.clone(), self.model_name.clone()));

        Ok(stream)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Drop caller extensions that would shadow modelled request fields
fn passthrough_extensions(extensions: &Map<String, Value>) -> Map<String, Value> {
    extensions
        .iter()
        .filter(|(key, _)| {
            let reserved = OpenAiRequest::RESERVED_KEYS.contains(&key.as_str());
            if reserved {
                tracing::debug!(key = %key, "ignoring extension that shadows a request field");
            }
            !reserved
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Turn a non-success response into a `Provider` error
async fn provider_error(response: Response) -> ChatError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    let message = match serde_json::from_str::<OpenAiErrorResponse>(&body) {
        Ok(envelope) => envelope.error.message,
        Err(_) if body.trim().is_empty() => status.canonical_reason().unwrap_or("no response body").to_owned(),
        Err(_) => body,
    };

    tracing::warn!(status = %status, message = %message, "upstream returned error");

    ChatError::Provider {
        status: status.as_u16(),
        message,
    }
}

async fn decode_completion(response: Response) -> Result<ChatResponse, ChatError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ChatError::transport(Stage::Decode, e))?;

    let wire: OpenAiResponse = serde_json::from_slice(&bytes)
        .map_err(|e| ChatError::MalformedResponse(format!("failed to parse response: {e}")))?;

    ChatResponse::try_from(wire)
}

/// Per-stream state turning provider chunks into stream events
#[derive(Debug, Default)]
pub(crate) struct StreamMultiplexer {
    tool_calls: ToolCallAccumulator,
}

impl StreamMultiplexer {
    /// Events produced by one chunk, in emission order
    ///
    /// A `done` event, if any, is always last.
    pub(crate) fn process(&mut self, chunk: &OpenAiStreamChunk) -> Vec<StreamResponse> {
        let Some(choice) = chunk.choices.first() else {
            return Vec::new();
        };

        let finished = choice.finish_reason.as_deref().is_some_and(|r| !r.is_empty());
        let mut events = Vec::new();

        for fragment in choice.delta.tool_calls.iter().flatten() {
            if let Some(started) = self.tool_calls.apply(&ToolCallDelta::from(fragment)) {
                events.push(StreamResponse::tool_call_started(
                    started.tool_name,
                    started.tool_call_id,
                ));
            }
        }

        if let Some(content) = choice.delta.content.as_deref().filter(|c| !c.is_empty()) {
            events.push(StreamResponse::answer(content, finished, self.tool_calls.snapshot()));
            if finished {
                return events;
            }
        }

        if finished && !self.tool_calls.is_empty() {
            events.push(StreamResponse::terminal(self.tool_calls.snapshot()));
        }

        events
    }

    pub(crate) fn snapshot(&self) -> Option<Vec<ToolCall>> {
        self.tool_calls.snapshot()
    }
}

/// Read SSE payloads until the stream ends, forwarding events to `sink`
///
/// `[DONE]`, EOF, a transport error, an undecodable chunk, and cancellation
/// all end the stream with a terminal snapshot event.
pub(crate) async fn pump_stream<S, E>(payloads: S, mut sink: EventSink, cancel: CancellationToken, model: String)
where
    S: Stream<Item = Result<String, E>>,
    E: Display,
{
    let mut payloads = std::pin::pin!(payloads);
    let mut multiplexer = StreamMultiplexer::default();

    'read: loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!(model = %model, "stream cancelled by caller");
                break;
            }
            next = payloads.next() => next,
        };

        let payload = match next {
            None => break,
            Some(Err(e)) => {
                tracing::warn!(model = %model, error = %e, "stream transport failed");
                break;
            }
            Some(Ok(payload)) => payload,
        };

        let payload = payload.trim();
        if payload.is_empty() {
            continue;
        }
        if payload == "[DONE]" {
            break;
        }

        let chunk: OpenAiStreamChunk = match serde_json::from_str(payload) {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::warn!(model = %model, error = %e, "undecodable stream chunk");
                break;
            }
        };

        for event in multiplexer.process(&chunk) {
            if !sink.send(event).await {
                break 'read;
            }
        }
    }

    sink.finish(multiplexer.snapshot()).await;
}
