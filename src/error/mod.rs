//! Error types for Palaver.

use thiserror::Error;

/// Primary error type for all Palaver operations.
#[derive(Error, Debug)]
pub enum PalaverError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Rate limited: retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Stream error: {0}")]
    Stream(String),

    /// A dispatch failure already rendered as a localized, user-displayable
    /// message. Produced by the completion client; callers show it verbatim.
    #[error("{0}")]
    ChatFailed(String),
}

impl PalaverError {
    /// Whether this error is a provider rate-limit signal.
    ///
    /// Rate limits are the only failures the retry policy acts on; everything
    /// else is surfaced on the first occurrence.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Whether this is a permanent request-shape error (caller/input fault).
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, Self::InvalidRequest(_))
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, PalaverError>;
