//! Agrisense Error Types
//!
//! Terminal errors surfaced by the dispatcher and the advisory layer, plus the
//! per-attempt error produced by a generation client.

use thiserror::Error;

/// A single failed generation attempt
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// Endpoint answered with a non-success status
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Connection failure, timeout, DNS
    #[error("transport error: {0}")]
    Transport(String),

    /// Success status, but no usable text in the body
    #[error("malformed provider response: {0}")]
    Response(String),

    /// A client handle could not be built for a credential
    #[error("failed to create client: {0}")]
    Client(String),
}

impl ProviderError {
    /// HTTP status, if the endpoint produced one
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            ProviderError::Transport(err.to_string())
        } else if err.is_decode() {
            ProviderError::Response(format!("Failed to decode response: {}", err))
        } else if err.is_builder() {
            ProviderError::Client(err.to_string())
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}

/// Main error type for Agrisense operations
#[derive(Debug, Error)]
pub enum AgrisenseError {
    /// No usable API keys were configured
    #[error(
        "No usable API keys configured. Set GEMINI_API_KEY (or GEMINI_API_KEY_2 / GEMINI_API_KEY_3)"
    )]
    NoCredentials,

    /// The provider rejected the request in a way rotating keys cannot fix
    #[error("Request rejected by provider using key #{credential}: {source}")]
    NonRetryable {
        credential: usize,
        #[source]
        source: ProviderError,
    },

    /// Every attempt failed with a retryable error
    #[error("All {attempts} attempts failed. Consider adding more API keys for rotation. Last error: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: ProviderError,
    },

    /// Configuration errors (unreadable file, invalid JSON)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generated text could not be decoded
    #[error("Response error: {0}")]
    Response(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AgrisenseError {
    /// The provider error behind a terminal dispatch failure, if any
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            AgrisenseError::NonRetryable { source, .. }
            | AgrisenseError::RetriesExhausted { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for AgrisenseError {
    fn from(err: serde_json::Error) -> Self {
        AgrisenseError::Response(format!("JSON parsing error: {}", err))
    }
}

impl From<std::io::Error> for AgrisenseError {
    fn from(err: std::io::Error) -> Self {
        AgrisenseError::Config(format!("IO error: {}", err))
    }
}

/// Result type alias for Agrisense operations
pub type Result<T> = std::result::Result<T, AgrisenseError>;
