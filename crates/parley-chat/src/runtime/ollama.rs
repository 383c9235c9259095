//! Ollama HTTP runtime client

use async_trait::async_trait;
use parley_config::LocalRuntimeConfig;
use reqwest::{Client, Response};
use tokio_util::sync::CancellationToken;

use super::{LocalRuntime, RuntimeStream, decode_ndjson};
use crate::error::{ChatError, Stage};
use crate::protocol::ollama::{
    OllamaChatRequest, OllamaErrorResponse, OllamaPullRequest, OllamaPullResponse, OllamaTagsResponse,
};
use crate::provider::cancellable;

/// Runtime backed by an Ollama server
pub struct OllamaRuntime {
    client: Client,
    base_url: String,
    pull_on_demand: bool,
}

impl OllamaRuntime {
    /// Create from runtime configuration
    pub fn new(config: &LocalRuntimeConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.as_str().trim_end_matches('/').to_owned(),
            pull_on_demand: config.pull_on_demand,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Names of models installed locally
    async fn installed_models(&self) -> Result<Vec<String>, String> {
        let response = self
            .client
            .get(self.url("/api/tags"))
            .send()
            .await
            .map_err(|e| format!("cannot reach runtime: {e}"))?;

        if !response.status().is_success() {
            return Err(format!("tag listing failed: {}", error_message(response).await));
        }

        let tags: OllamaTagsResponse = response
            .json()
            .await
            .map_err(|e| format!("failed to parse tag listing: {e}"))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    async fn pull(&self, model: &str) -> Result<(), String> {
        let request = OllamaPullRequest {
            model: model.to_owned(),
            stream: false,
        };

        let response = self
            .client
            .post(self.url("/api/pull"))
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("cannot reach runtime: {e}"))?;

        if !response.status().is_success() {
            return Err(format!("pull failed: {}", error_message(response).await));
        }

        let status: OllamaPullResponse = response
            .json()
            .await
            .map_err(|e| format!("failed to parse pull status: {e}"))?;

        match status.error {
            Some(error) => Err(format!("pull failed: {error}")),
            None => Ok(()),
        }
    }

    async fn ensure(&self, model: &str) -> Result<(), ChatError> {
        let unavailable = |reason: String| ChatError::ModelUnavailable {
            model: model.to_owned(),
            reason,
        };

        let installed = self.installed_models().await.map_err(unavailable)?;
        if installed.iter().any(|name| matches_model(name, model)) {
            tracing::debug!(model, "model already installed");
            return Ok(());
        }

        if !self.pull_on_demand {
            return Err(unavailable("not installed and pulling is disabled".to_owned()));
        }

        tracing::info!(model, "pulling model");
        self.pull(model).await.map_err(|reason| {
            tracing::error!(model, reason = %reason, "model pull failed");
            unavailable(reason)
        })?;
        tracing::info!(model, "model pulled");

        Ok(())
    }
}

#[async_trait]
impl LocalRuntime for OllamaRuntime {
    async fn ensure_model_available(&self, model: &str, cancel: &CancellationToken) -> Result<(), ChatError> {
        cancellable(cancel, self.ensure(model)).await
    }

    async fn chat(
        &self,
        request: &OllamaChatRequest,
        cancel: &CancellationToken,
    ) -> Result<RuntimeStream, ChatError> {
        let send = async {
            self.client
                .post(self.url("/api/chat"))
                .json(request)
                .send()
                .await
                .map_err(|e| ChatError::transport(Stage::Send, e))
        };
        let response = cancellable(cancel, send).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Provider {
                status: status.as_u16(),
                message: error_message(response).await,
            });
        }

        Ok(decode_ndjson(response.bytes_stream()))
    }
}

/// Whether an installed tag satisfies a requested model name
///
/// An untagged request matches the `latest` tag.
fn matches_model(installed: &str, requested: &str) -> bool {
    installed == requested
        || (!requested.contains(':')
            && installed
                .strip_prefix(requested)
                .is_some_and(|tag| tag == ":latest"))
}

async fn error_message(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    match serde_json::from_str::<OllamaErrorResponse>(&body) {
        Ok(envelope) => envelope.error,
        Err(_) if body.trim().is_empty() => status.to_string(),
        Err(_) => body,
    }
}
