use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Default base URL for remote OpenAI-compatible providers
pub const DEFAULT_REMOTE_BASE_URL: &str = "https://api.openai.com/v1";

/// Default address of a locally running Ollama daemon
pub const DEFAULT_LOCAL_BASE_URL: &str = "http://localhost:11434";

/// Construction input for a chat backend
///
/// `source` stays a plain string so that unknown values are reported by the
/// backend selector rather than rejected during deserialization.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatConfig {
    /// Backend kind, `local` or `remote` (case-insensitive)
    pub source: String,
    /// Provider base URL, e.g. `https://api.openai.com/v1`
    #[serde(default)]
    pub base_url: Option<Url>,
    /// Model name sent to the backend
    pub model_name: String,
    /// Bearer credential for remote providers
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Caller-side identifier for this model
    #[serde(default)]
    pub model_id: String,
}

impl ChatConfig {
    /// Base URL as a string without a trailing slash
    pub fn base_url_str(&self) -> Option<&str> {
        self.base_url.as_ref().map(|u| u.as_str().trim_end_matches('/'))
    }
}

/// Settings for the local inference runtime
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocalRuntimeConfig {
    /// Ollama API address
    #[serde(default = "default_local_base_url")]
    pub base_url: Url,
    /// Pull a missing model instead of failing
    #[serde(default = "default_pull_on_demand")]
    pub pull_on_demand: bool,
}

impl Default for LocalRuntimeConfig {
    fn default() -> Self {
        Self {
            base_url: default_local_base_url(),
            pull_on_demand: default_pull_on_demand(),
        }
    }
}

fn default_local_base_url() -> Url {
    Url::parse(DEFAULT_LOCAL_BASE_URL).expect("valid default URL")
}

const fn default_pull_on_demand() -> bool {
    true
}
