use serde_json::{Map, Value};

use super::tool::{Tool, ToolChoice};

/// Sampling and control knobs for one chat call
///
/// Every numeric field is "provider default" when `None`; zero and negative
/// values are treated the same as unset and never forwarded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatOptions {
    /// Sampling temperature
    pub temperature: Option<f64>,
    /// Nucleus sampling threshold
    pub top_p: Option<f64>,
    /// Random seed
    pub seed: Option<u64>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Maximum completion tokens, for providers that distinguish it
    pub max_completion_tokens: Option<u32>,
    /// Frequency penalty
    pub frequency_penalty: Option<f64>,
    /// Presence penalty
    pub presence_penalty: Option<f64>,
    /// Reasoning mode toggle; `None` leaves the backend default
    pub thinking: Option<bool>,
    /// Tools the model may call
    pub tools: Vec<Tool>,
    /// Tool selection directive
    pub tool_choice: Option<ToolChoice>,
    /// Vendor-specific top-level request fields passed through verbatim
    pub extensions: Map<String, Value>,
}

impl ChatOptions {
    pub(crate) fn temperature(&self) -> Option<f64> {
        positive_f64(self.temperature)
    }

    pub(crate) fn top_p(&self) -> Option<f64> {
        positive_f64(self.top_p)
    }

    pub(crate) fn frequency_penalty(&self) -> Option<f64> {
        positive_f64(self.frequency_penalty)
    }

    pub(crate) fn presence_penalty(&self) -> Option<f64> {
        positive_f64(self.presence_penalty)
    }

    pub(crate) fn max_tokens(&self) -> Option<u32> {
        self.max_tokens.filter(|v| *v > 0)
    }

    pub(crate) fn max_completion_tokens(&self) -> Option<u32> {
        self.max_completion_tokens.filter(|v| *v > 0)
    }

    pub(crate) fn seed(&self) -> Option<u64> {
        self.seed.filter(|v| *v > 0)
    }
}

fn positive_f64(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_values_are_unset() {
        let options = ChatOptions {
            temperature: Some(0.0),
            top_p: Some(0.9),
            max_tokens: Some(0),
            seed: Some(0),
            presence_penalty: Some(-0.5),
            ..ChatOptions::default()
        };

        assert_eq!(options.temperature(), None);
        assert_eq!(options.top_p(), Some(0.9));
        assert_eq!(options.max_tokens(), None);
        assert_eq!(options.seed(), None);
        assert_eq!(options.presence_penalty(), None);
    }
}
