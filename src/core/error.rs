//! Failure taxonomy for provider calls.
//!
//! Every outbound call resolves to either a payload or a [`FetchError`]; a
//! provider never panics and never retries on its own. Retrying and falling
//! through the provider chain is the acquirer's job, driven by the error kind.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Connection-level failure or unexpected server error.
    Network,
    /// The request exceeded the configured timeout.
    Timeout,
    /// HTTP 429 or an equivalent provider-specific throttle signal.
    RateLimited,
    /// The response body did not match the provider's schema.
    InvalidResponse,
    /// Missing or rejected API key.
    Auth,
}

impl FetchErrorKind {
    /// Retrying the same provider can only help for transient conditions.
    pub fn is_retryable(self) -> bool {
        matches!(self, FetchErrorKind::RateLimited | FetchErrorKind::Timeout)
    }
}

#[derive(Debug, Clone, Error)]
#[error("{provider}: {kind:?}: {message}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub provider: String,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, provider: &str, message: impl Into<String>) -> Self {
        FetchError {
            kind,
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    pub fn invalid(provider: &str, message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::InvalidResponse, provider, message)
    }

    pub fn kind(&self) -> FetchErrorKind {
        self.kind
    }

    /// Classify a transport-level reqwest error.
    pub fn from_reqwest(provider: &str, err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            FetchErrorKind::Timeout
        } else {
            FetchErrorKind::Network
        };
        Self::new(kind, provider, err.to_string())
    }

    /// Classify a non-2xx HTTP status.
    pub fn from_status(provider: &str, status: reqwest::StatusCode) -> Self {
        let kind = match status.as_u16() {
            429 => FetchErrorKind::RateLimited,
            401 | 403 => FetchErrorKind::Auth,
            400..=499 => FetchErrorKind::InvalidResponse,
            _ => FetchErrorKind::Network,
        };
        Self::new(kind, provider, format!("HTTP status {status}"))
    }
}
