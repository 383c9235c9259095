#![allow(clippy::must_use_candidate)]

pub mod chat;
mod env;
mod loader;
pub mod telemetry;

use serde::Deserialize;

pub use chat::*;
pub use telemetry::{LogFormat, TelemetryConfig};

/// Top-level Parley configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Chat backend selection and credentials
    pub chat: ChatConfig,
    /// Local inference runtime settings
    #[serde(default)]
    pub local: LocalRuntimeConfig,
    /// Logging configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}
