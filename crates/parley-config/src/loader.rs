use std::path::Path;

use url::Url;

use crate::{Config, DEFAULT_REMOTE_BASE_URL};

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, a placeholder cannot be
    /// resolved, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml(&raw)
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if placeholder expansion, parsing, or validation fails
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let mut config: Self =
            toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;
        config.apply_defaults()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if the model name is blank
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.chat.model_name.trim().is_empty() {
            anyhow::bail!("chat.model_name must not be empty");
        }

        Ok(())
    }

    fn apply_defaults(&mut self) -> anyhow::Result<()> {
        if self.chat.base_url.is_none() && self.chat.source.eq_ignore_ascii_case("remote") {
            self.chat.base_url = Some(Url::parse(DEFAULT_REMOTE_BASE_URL)?);
        }

        Ok(())
    }
}
