//! Generation Client Traits
//!
//! The seam between the dispatcher and a concrete text-generation provider.
//! Any provider that can turn an [`Envelope`] into text (or an error) plugs in
//! by implementing these two traits.

use crate::api::Envelope;
use crate::error::ProviderError;
use crate::router::Credential;
use async_trait::async_trait;

/// A credential-bound handle to a generation endpoint
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generate text for the envelope
    ///
    /// When the envelope declares a response schema the provider is asked for
    /// JSON, but the text is returned as-is; decoding is the caller's job.
    async fn generate(&self, envelope: &Envelope) -> Result<String, ProviderError>;
}

/// Builds one client handle per credential
///
/// The dispatcher calls `connect` at most once per credential and caches
/// the handle for the rest of its lifetime.
pub trait ClientFactory: Send + Sync {
    type Client: GenerationClient + 'static;

    fn connect(&self, credential: &Credential) -> Result<Self::Client, ProviderError>;
}
