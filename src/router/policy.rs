//! Rotation Policy
//!
//! Decides, per failed attempt, whether to rotate to the next key and retry or
//! to give up immediately.

use crate::client::classifier;
use crate::config::RotationMode;
use crate::error::ProviderError;
use std::fmt;
use std::sync::Arc;

/// Retry predicate over a failed attempt
pub type RetryPredicate = Arc<dyn Fn(&ProviderError) -> bool + Send + Sync>;

/// When a failed attempt should rotate keys and retry
#[derive(Clone, Default)]
pub enum RotationPolicy {
    /// Rotate only on rate limit, quota, and transient failures
    #[default]
    Classified,

    /// Rotate on every failure, including malformed requests
    AnyError,

    /// Caller-supplied predicate
    Custom(RetryPredicate),
}

impl RotationPolicy {
    /// Build a policy from a predicate
    pub fn custom<P>(predicate: P) -> Self
    where
        P: Fn(&ProviderError) -> bool + Send + Sync + 'static,
    {
        RotationPolicy::Custom(Arc::new(predicate))
    }

    /// Whether this failure should consume a retry on the next key
    pub fn should_rotate(&self, err: &ProviderError) -> bool {
        match self {
            RotationPolicy::Classified => classifier::is_retryable(err),
            RotationPolicy::AnyError => true,
            RotationPolicy::Custom(predicate) => predicate(err),
        }
    }
}

impl fmt::Debug for RotationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RotationPolicy::Classified => f.write_str("Classified"),
            RotationPolicy::AnyError => f.write_str("AnyError"),
            RotationPolicy::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl From<RotationMode> for RotationPolicy {
    fn from(mode: RotationMode) -> Self {
        match mode {
            RotationMode::Classified => RotationPolicy::Classified,
            RotationMode::AnyError => RotationPolicy::AnyError,
        }
    }
}
