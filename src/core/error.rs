//! Custom error types for Baton
//!
//! `BatonError` covers fallible plumbing (provider calls, configuration,
//! registration). Terminal outcomes of a reasoning loop or handoff chain are
//! reported as data through [`FailureKind`], never as `Err`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Baton operations
#[derive(Error, Debug)]
pub enum BatonError {
    /// Language-model provider errors (transport, API, decoding)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Model not available on the provider
    #[error("Model '{0}' not available. Run: ollama pull {0}")]
    ModelNotFound(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// An agent with the same name is already registered
    #[error("Agent '{0}' is already registered")]
    DuplicateAgent(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type for Baton operations
pub type Result<T> = std::result::Result<T, BatonError>;

impl BatonError {
    /// Create a provider error
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Why a reasoning loop or a handoff chain ended without an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The loop used every step without producing a final answer
    BudgetExceeded,
    /// External cancellation was observed
    Cancelled,
    /// The language-model call failed
    ProviderFailure,
    /// One agent's loop ran past the per-hop timeout
    HopTimeout,
    /// A handoff named an agent that is not registered
    UnknownHandoffTarget,
    /// The chain already performed the maximum number of handoffs
    DepthExceeded,
    /// A handoff would revisit an agent already in the chain
    CycleDetected,
    /// The chain ran past the total timeout
    ChainTimeout,
    /// The single fallback attempt failed as well
    FallbackExhausted,
}

impl FailureKind {
    /// Whether this failure may be retried through the fallback path.
    pub fn allows_fallback(&self) -> bool {
        !matches!(
            self,
            FailureKind::Cancelled | FailureKind::CycleDetected | FailureKind::FallbackExhausted
        )
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FailureKind::BudgetExceeded => "budget exceeded",
            FailureKind::Cancelled => "cancelled",
            FailureKind::ProviderFailure => "provider failure",
            FailureKind::HopTimeout => "hop timeout",
            FailureKind::UnknownHandoffTarget => "unknown handoff target",
            FailureKind::DepthExceeded => "depth exceeded",
            FailureKind::CycleDetected => "cycle detected",
            FailureKind::ChainTimeout => "chain timeout",
            FailureKind::FallbackExhausted => "fallback exhausted",
        };
        f.write_str(label)
    }
}
