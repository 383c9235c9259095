use std::fmt;

use thiserror::Error;

/// Phase of a backend call in which a transport failure occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Constructing the outgoing request
    Build,
    /// Sending the request and waiting for response headers
    Send,
    /// Reading or decoding the response body
    Decode,
    /// Reading an open response stream
    Stream,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Build => "build",
            Self::Send => "send",
            Self::Decode => "decode",
            Self::Stream => "stream",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during chat operations
#[derive(Debug, Error)]
pub enum ChatError {
    /// The local runtime could not materialize the requested model
    #[error("model {model} is unavailable: {reason}")]
    ModelUnavailable { model: String, reason: String },

    /// Configured backend source is not recognised
    #[error("unsupported chat model source: {value}")]
    UnsupportedSource { value: String },

    /// Messages or options could not be turned into a valid request
    #[error("invalid request: {0}")]
    RequestBuild(String),

    /// Connection or I/O failure
    #[error("transport error during {stage}: {message}")]
    Transport { stage: Stage, message: String },

    /// Upstream returned a non-success status or reported a failure
    #[error("provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    /// Response body could not be decoded
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Provider answered with zero choices
    #[error("provider returned no choices")]
    EmptyResponse,

    /// Caller's cancellation token fired before the call completed
    #[error("request cancelled")]
    Cancelled,
}

impl ChatError {
    /// Build a transport error for the given stage
    pub fn transport(stage: Stage, err: impl fmt::Display) -> Self {
        Self::Transport {
            stage,
            message: err.to_string(),
        }
    }

    /// Whether retrying the same call might succeed
    ///
    /// Connection failures, rate limits, and server-side errors are transient;
    /// everything else will fail again with the same input.
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Provider { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
