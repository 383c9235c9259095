//! Configuration helpers for integration tests

use parley_config::{ChatConfig, LocalRuntimeConfig};
use secrecy::SecretString;
use url::Url;

/// Remote chat configuration pointed at a mock backend
pub fn remote(model: &str, base_url: &str) -> ChatConfig {
    ChatConfig {
        source: "remote".to_owned(),
        base_url: Some(Url::parse(base_url).unwrap()),
        model_name: model.to_owned(),
        api_key: Some(SecretString::from("sk-test-key")),
        model_id: format!("{model}-id"),
    }
}

/// Local chat configuration for `model`
pub fn local(model: &str) -> ChatConfig {
    ChatConfig {
        source: "local".to_owned(),
        base_url: None,
        model_name: model.to_owned(),
        api_key: None,
        model_id: format!("{model}-id"),
    }
}

/// Runtime configuration pointed at a mock runtime
pub fn runtime(base_url: Url, pull_on_demand: bool) -> LocalRuntimeConfig {
    LocalRuntimeConfig {
        base_url,
        pull_on_demand,
    }
}
