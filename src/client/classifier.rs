//! Failure Classification
//!
//! Decides whether a failed generation attempt is worth retrying with another key.

use crate::error::ProviderError;

/// Substrings that mark rate limit, quota, or transient overload failures
const RETRYABLE_MARKERS: &[&str] = &[
    "429",
    "rate limit",
    "rate_limit",
    "too many requests",
    "quota",
    "resource_exhausted",
    "overloaded",
    "unavailable",
];

/// Detect if a status code indicates a rate limit or transient server failure
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Detect if a response body or error text reads like a rate limit
pub fn has_retryable_marker(text: &str) -> bool {
    let lower = text.to_lowercase();
    RETRYABLE_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Default retry predicate
///
/// Malformed requests, auth failures, unknown models and unusable response
/// bodies are permanent: another key will not fix them.
pub fn is_retryable(err: &ProviderError) -> bool {
    match err {
        ProviderError::Status { status, body } => {
            is_retryable_status(*status) || has_retryable_marker(body)
        }
        ProviderError::Transport(_) => true,
        ProviderError::Response(msg) | ProviderError::Client(msg) => has_retryable_marker(msg),
    }
}
