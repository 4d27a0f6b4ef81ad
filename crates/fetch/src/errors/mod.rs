//! Error types and classification for fetch orchestration.
//!
//! This module provides:
//! - [`ErrorCode`]: the fixed classification codes for provider failures
//! - [`ProviderError`]: the classified failure raised by provider adapters
//! - [`ErrorEnvelope`]: the sanitized error shape surfaced to callers

mod classify;

pub use classify::{is_rate_limit_exhaustion, map_status_to_code, RATE_LIMIT_PATTERNS};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification codes for provider failures.
///
/// Every adapter failure carries exactly one of these codes. The code
/// determines retriability and how the orchestrator reacts to the failure.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The provider signalled quota exhaustion. Trips the circuit breaker.
    RateLimit,
    /// Credentials were rejected. Terminal for this provider.
    Auth,
    /// The entity is absent at this provider. Terminal here, but the next
    /// provider may still have it.
    NotFound,
    /// Generic non-2xx or protocol-level failure.
    Upstream,
    /// Transport-level failure.
    Network,
    /// The provider returned a payload that could not be interpreted.
    BadResponse,
}

impl ErrorCode {
    /// Whether a failure with this code is worth retrying against another
    /// provider or later. Auth and NotFound are terminal.
    pub fn is_retriable(&self) -> bool {
        !matches!(self, Self::Auth | Self::NotFound)
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            Self::RateLimit => "RATE_LIMIT",
            Self::Auth => "AUTH",
            Self::NotFound => "NOT_FOUND",
            Self::Upstream => "UPSTREAM",
            Self::Network => "NETWORK",
            Self::BadResponse => "BAD_RESPONSE",
        };
        write!(f, "{}", code)
    }
}

/// Classified failure raised by a provider adapter.
///
/// Adapters map their transport and parsing failures into this shape before
/// the orchestrator ever sees them. `message` is logged but never forwarded
/// to callers.
#[derive(Clone, Debug, Error)]
#[error("{code}: {message}")]
pub struct ProviderError {
    /// Classification code.
    pub code: ErrorCode,
    /// Diagnostic message. Log-only; may contain upstream detail.
    pub message: String,
    /// HTTP status of the upstream response, when there was one.
    pub status: Option<u16>,
    /// Identity of the provider that produced the failure.
    pub provider: Option<String>,
}

impl ProviderError {
    /// Create a classified failure with no status or provider attribution.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
            provider: None,
        }
    }

    /// Attach the upstream HTTP status.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Attach the originating provider identity.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }
}

/// Sanitized error surfaced to callers inside a result envelope.
///
/// `message` holds fixed, caller-facing text only. Raw upstream response
/// content (error bodies, secrets, tokens) must never reach this type.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Classification code.
    pub code: ErrorCode,
    /// Stable caller-facing message.
    pub message: String,
    /// Whether the caller may usefully retry later.
    pub retriable: bool,
    /// Originating provider identity, when one is attributable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl ErrorEnvelope {
    /// Create an envelope, deriving retriability from the code.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            retriable: code.is_retriable(),
            provider: None,
        }
    }

    /// Attach the originating provider identity.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }
}
