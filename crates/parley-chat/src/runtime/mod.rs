//! Local model runtime used by the Ollama-backed adapter

pub mod ollama;

use std::fmt::Display;
use std::pin::Pin;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt, stream};
use tokio_util::sync::CancellationToken;

pub use self::ollama::OllamaRuntime;
use crate::error::{ChatError, Stage};
use crate::protocol::ollama::{OllamaChatRequest, OllamaChatResponse};

/// Stream of decoded `/api/chat` records
pub type RuntimeStream = Pin<Box<dyn Stream<Item = Result<OllamaChatResponse, ChatError>> + Send>>;

/// A local runtime able to materialize and run models
#[async_trait]
pub trait LocalRuntime: Send + Sync {
    /// Make sure `model` is present locally, fetching it if needed
    async fn ensure_model_available(&self, model: &str, cancel: &CancellationToken) -> Result<(), ChatError>;

    /// Start a chat request, yielding records as the runtime produces them
    ///
    /// Non-streaming requests yield a single record.
    async fn chat(&self, request: &OllamaChatRequest, cancel: &CancellationToken)
    -> Result<RuntimeStream, ChatError>;
}

struct LineReader<S> {
    source: Pin<Box<S>>,
    buffer: Vec<u8>,
    exhausted: bool,
}

impl<S> LineReader<S> {
    /// Take the next complete line out of the buffer
    fn next_line(&mut self) -> Option<Vec<u8>> {
        let pos = self.buffer.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
        line.pop();
        Some(line)
    }
}

/// Split a byte stream into newline-delimited JSON records
///
/// A trailing record without a newline is still decoded at EOF. A transport
/// error ends the stream after being yielded.
pub(crate) fn decode_ndjson<S, B, E>(source: S) -> RuntimeStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: Display + Send,
{
    let reader = LineReader {
        source: Box::pin(source),
        buffer: Vec::new(),
        exhausted: false,
    };

    Box::pin(stream::unfold(reader, |mut reader| async move {
        loop {
            if let Some(line) = reader.next_line() {
                if line.trim_ascii().is_empty() {
                    continue;
                }
                return Some((parse_record(&line), reader));
            }

            if reader.exhausted {
                return None;
            }

            match reader.source.next().await {
                Some(Ok(chunk)) => reader.buffer.extend_from_slice(chunk.as_ref()),
                Some(Err(e)) => {
                    reader.exhausted = true;
                    reader.buffer.clear();
                    return Some((Err(ChatError::transport(Stage::Stream, e)), reader));
                }
                None => {
                    reader.exhausted = true;
                    if !reader.buffer.is_empty() {
                        reader.buffer.push(b'\n');
                    }
                }
            }
        }
    }))
}

fn parse_record(line: &[u8]) -> Result<OllamaChatResponse, ChatError> {
    let mut record: OllamaChatResponse = serde_json::from_slice(line)
        .map_err(|e| ChatError::MalformedResponse(format!("failed to parse runtime record: {e}")))?;

    // the runtime reports mid-generation failures in-band after a 200
    if let Some(message) = record.error.take().filter(|m| !m.is_empty()) {
        return Err(ChatError::Provider { status: 500, message });
    }

    Ok(record)
}
