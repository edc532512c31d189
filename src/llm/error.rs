// src/llm/error.rs
// Typed failures surfaced by the OpenAI client

use serde_json::Value;

/// Every failure path of a generation call, kept distinguishable so the
/// caller can pick retry vs fatal-abort messaging.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Invalid OpenAI response: {detail}")]
    InvalidResponse {
        detail: String,
        /// Full upstream payload, attached when parsing gave up
        raw: Option<Value>,
    },

    #[error("OpenAI API error: {detail}")]
    Api {
        detail: String,
        /// Failed before an HTTP status was received
        transport: bool,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("All {completion_tokens} completion tokens used for reasoning ({reasoning_tokens} reasoning). Increase max_completion_tokens.")]
    ReasoningBudgetExhausted {
        completion_tokens: u64,
        reasoning_tokens: u64,
    },

    #[error("OpenAI quota exceeded. Please check your billing and usage limits at https://platform.openai.com/usage")]
    QuotaExceeded,

    #[error("OpenAI rate limit exceeded. Please wait a moment and try again.")]
    RateLimited,

    #[error("Invalid OpenAI API key. Please check your API key configuration.")]
    InvalidApiKey,
}

pub type Result<T> = std::result::Result<T, LlmError>;

impl LlmError {
    pub fn invalid_response(detail: impl Into<String>) -> Self {
        Self::InvalidResponse {
            detail: detail.into(),
            raw: None,
        }
    }

    /// Non-success HTTP status
    pub fn api(detail: impl Into<String>) -> Self {
        Self::Api {
            detail: detail.into(),
            transport: false,
        }
    }

    /// Connection, timeout or body-read failure
    pub fn network(detail: impl Into<String>) -> Self {
        Self::Api {
            detail: format!("Network error: {}", detail.into()),
            transport: true,
        }
    }

    pub fn configuration(detail: impl Into<String>) -> Self {
        Self::Configuration(detail.into())
    }

    /// Raw payload attached to an `InvalidResponse`, if any
    pub fn raw_payload(&self) -> Option<&Value> {
        match self {
            Self::InvalidResponse { raw, .. } => raw.as_ref(),
            _ => None,
        }
    }

    /// Worth trying again after a backoff. Only rate limiting and transport
    /// failures qualify.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited => true,
            Self::Api { transport, .. } => *transport,
            _ => false,
        }
    }

    /// Needs a billing or configuration change before any call can succeed
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::QuotaExceeded | Self::InvalidApiKey | Self::Configuration(_)
        )
    }
}
