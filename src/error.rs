// src/error.rs
//! Closed error taxonomy for the engine. Callers pattern-match on these
//! variants instead of provider-specific shapes.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Missing or unusable caller input. Never retried.
    #[error("validation error: {0}")]
    Validation(String),

    /// Every model candidate answered "not found".
    #[error("no usable generative model (tried: {})", tried.join(", "))]
    NoUsableModel { tried: Vec<String> },

    #[error("authentication with the model provider failed: {0}")]
    Authentication(String),

    #[error("permission denied by the model provider: {0}")]
    Permission(String),

    #[error("model provider rate limit reached: {0}")]
    RateLimited(String),

    #[error("network error reaching the model provider: {0}")]
    Network(String),

    #[error("model provider call timed out: {0}")]
    Timeout(String),

    /// Provider error with an HTTP status that has no dedicated variant.
    #[error("model provider error (status {status}): {message}")]
    Provider { status: u16, message: String },

    /// Malformed structured output from the model. Carries the raw text so
    /// the failure can be diagnosed; never silently discarded.
    #[error("failed to parse structured model output: {message}")]
    Parse { message: String, raw: String },

    #[error("internal error: {0}")]
    Other(#[from] anyhow::Error),
}

impl EngineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Stable machine-readable code for the uniform response envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NoUsableModel { .. } => "NO_USABLE_MODEL",
            Self::Authentication(_) => "AUTHENTICATION_ERROR",
            Self::Permission(_) => "PERMISSION_ERROR",
            Self::RateLimited(_) => "RATE_LIMIT_ERROR",
            Self::Network(_) => "NETWORK_ERROR",
            Self::Timeout(_) => "TIMEOUT_ERROR",
            Self::Provider { .. } => "PROVIDER_ERROR",
            Self::Parse { .. } => "PARSE_ERROR",
            Self::Other(_) => "INTERNAL_ERROR",
        }
    }
}
