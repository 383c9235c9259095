//! Backend selection from configuration

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use parley_config::ChatConfig;
use tokio_util::sync::CancellationToken;

use crate::error::ChatError;
use crate::provider::local::LocalChat;
use crate::provider::remote::RemoteChat;
use crate::provider::{Chat, ChatStream};
use crate::runtime::LocalRuntime;
use crate::types::{ChatOptions, ChatResponse, Message};

/// Where a chat model is served from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSource {
    Local,
    Remote,
}

impl FromStr for ModelSource {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "remote" => Ok(Self::Remote),
            _ => Err(ChatError::UnsupportedSource { value: s.to_owned() }),
        }
    }
}

/// Chat backend chosen at construction time
pub enum ChatBackend {
    Local(LocalChat),
    Remote(RemoteChat),
}

impl ChatBackend {
    /// Build the backend named by `config.source`
    ///
    /// The runtime is only used when the source is local.
    pub fn new(config: &ChatConfig, runtime: Arc<dyn LocalRuntime>) -> Result<Self, ChatError> {
        let backend = match config.source.parse()? {
            ModelSource::Local => Self::Local(LocalChat::new(config, runtime)),
            ModelSource::Remote => Self::Remote(RemoteChat::new(config)),
        };

        tracing::debug!(
            source = ?backend.source(),
            model = %config.model_name,
            "chat backend selected"
        );

        Ok(backend)
    }

    pub const fn source(&self) -> ModelSource {
        match self {
            Self::Local(_) => ModelSource::Local,
            Self::Remote(_) => ModelSource::Remote,
        }
    }

    fn inner(&self) -> &dyn Chat {
        match self {
            Self::Local(chat) => chat,
            Self::Remote(chat) => chat,
        }
    }
}

#[async_trait]
impl Chat for ChatBackend {
    async fn chat(
        &self,
        messages: &[Message],
        options: &ChatOptions,
        cancel: &CancellationToken,
    ) -> Result<ChatResponse, ChatError> {
        self.inner().chat(messages, options, cancel).await
    }

    async fn chat_stream(
        &self,
        messages: &[Message],
        options: &ChatOptions,
        cancel: &CancellationToken,
    ) -> Result<ChatStream, ChatError> {
        self.inner().chat_stream(messages, options, cancel).await
    }

    fn model_name(&self) -> &str {
        self.inner().model_name()
    }

    fn model_id(&self) -> &str {
        self.inner().model_id()
    }
}
