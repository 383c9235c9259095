//! Conversion between chat types and the Ollama wire format

use crate::protocol::ollama::{OllamaMessage, OllamaOptions};
use crate::types::{ChatOptions, Message, Usage};

impl From<&Message> for OllamaMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role.as_str().to_owned(),
            content: msg.content.clone(),
        }
    }
}

impl From<&ChatOptions> for OllamaOptions {
    fn from(options: &ChatOptions) -> Self {
        Self {
            temperature: options.temperature(),
            top_p: options.top_p(),
            num_predict: options.max_tokens(),
            seed: options.seed(),
        }
    }
}

/// Derive usage from runtime counters
///
/// Counts are only trusted when `eval_count` is reported; completion tokens
/// are `eval_count - prompt_eval_count`.
pub fn usage_from_counts(prompt_eval_count: u32, eval_count: u32) -> Usage {
    if eval_count == 0 {
        return Usage::default();
    }

    Usage::new(prompt_eval_count, eval_count.saturating_sub(prompt_eval_count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_only_carry_set_values() {
        let options = ChatOptions {
            temperature: Some(0.7),
            max_tokens: Some(256),
            frequency_penalty: Some(1.0),
            ..ChatOptions::default()
        };

        let value = serde_json::to_value(OllamaOptions::from(&options)).unwrap();
        assert_eq!(value, serde_json::json!({"temperature": 0.7, "num_predict": 256}));
    }

    #[test]
    fn default_options_are_empty() {
        assert!(OllamaOptions::from(&ChatOptions::default()).is_empty());
    }

    #[test]
    fn usage_subtracts_prompt_tokens() {
        assert_eq!(usage_from_counts(30, 50), Usage::new(30, 20));
        assert_eq!(usage_from_counts(30, 0), Usage::default());
        assert_eq!(usage_from_counts(80, 50), Usage::new(80, 0));
    }
}
