//! Provider-specific request quirks

/// DashScope's OpenAI-compatible endpoint
const DASHSCOPE_COMPATIBLE_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";

/// Vendor family of a remote model, resolved once at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vendor {
    /// Qwen3 served by DashScope
    ///
    /// Non-streaming calls must carry a top-level `enable_thinking: false`
    /// and are sent as a hand-built POST.
    AliyunQwen3,
    /// DeepSeek models, which reject `tool_choice`
    DeepSeek,
    /// Any other OpenAI-compatible provider
    Generic,
}

impl Vendor {
    /// Classify a model by name and base URL
    pub fn detect(model_name: &str, base_url: &str) -> Self {
        if model_name.starts_with("qwen3-") && base_url.trim_end_matches('/') == DASHSCOPE_COMPATIBLE_URL {
            Self::AliyunQwen3
        } else if model_name.to_lowercase().contains("deepseek") {
            Self::DeepSeek
        } else {
            Self::Generic
        }
    }

    /// Whether the vendor accepts a `tool_choice` field
    pub const fn supports_tool_choice(self) -> bool {
        !matches!(self, Self::DeepSeek)
    }

    /// Whether non-streaming calls need `enable_thinking: false` and a raw POST
    pub const fn forces_thinking_off(self) -> bool {
        matches!(self, Self::AliyunQwen3)
    }
}
