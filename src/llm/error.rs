//! LLM error types

use thiserror::Error;

/// LLM error with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct LlmError {
    pub kind: LlmErrorKind,
    pub message: String,
}

impl LlmError {
    pub fn new(kind: LlmErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Network, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Auth, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Unknown, message)
    }

    /// Classify a non-success HTTP status returned by a provider
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        let (kind, reason) = match status {
            400 => (LlmErrorKind::InvalidRequest, "Invalid request"),
            401 | 403 => (LlmErrorKind::Auth, "Authentication failed"),
            429 => (LlmErrorKind::RateLimit, "Rate limit exceeded"),
            500..=599 => (LlmErrorKind::ServerError, "Server error"),
            _ => return Self::unknown(format!("HTTP {status}: {message}")),
        };
        Self::new(kind, format!("{reason}: {message}"))
    }
}

/// Error classification.
///
/// We never retry in-process; the kind only feeds logs and failure events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// Network issues, timeouts
    Network,
    /// Rate limited (429)
    RateLimit,
    /// Server error (5xx)
    ServerError,
    /// Authentication failed (401, 403) or no key configured
    Auth,
    /// Bad request (400)
    InvalidRequest,
    /// Unknown error
    Unknown,
}

impl LlmErrorKind {
    /// Whether a provider-side retry could plausibly succeed
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Network | Self::RateLimit | Self::ServerError)
    }
}
