//! Failure classification helpers.

use super::{ErrorCode, ProviderError};

/// Phrases that identify quota exhaustion when a provider hides it in
/// message text instead of a 429 or an explicit code.
pub const RATE_LIMIT_PATTERNS: [&str; 5] = [
    "rate limit",
    "requests per day",
    "api credits",
    "premium plan",
    "limit exceeded",
];

/// Map an upstream HTTP status to a classification code.
///
/// Intended for adapter authors; the orchestrator itself never sees raw
/// statuses outside a [`ProviderError`].
pub fn map_status_to_code(status: u16) -> ErrorCode {
    match status {
        401 | 403 => ErrorCode::Auth,
        404 => ErrorCode::NotFound,
        429 => ErrorCode::RateLimit,
        _ => ErrorCode::Upstream,
    }
}

/// Whether a provider failure means the provider is out of quota.
///
/// True for an explicit RATE_LIMIT code, a 429 status, or a message matching
/// one of [`RATE_LIMIT_PATTERNS`] (case-insensitive substring).
pub fn is_rate_limit_exhaustion(error: &ProviderError) -> bool {
    if error.code == ErrorCode::RateLimit || error.status == Some(429) {
        return true;
    }
    let message = error.message.to_lowercase();
    RATE_LIMIT_PATTERNS
        .iter()
        .any(|pattern| message.contains(pattern))
}
