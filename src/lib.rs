//! Agrisense - field advisory engine
//!
//! Sensor-driven crop recommendations and soil summaries for precision
//! agriculture, generated by an LLM behind a dispatcher that rotates across
//! several API keys when one is rate limited.
//!
//! ```no_run
//! use agrisense::{Advisor, GeminiDispatcher};
//! use std::sync::Arc;
//!
//! # async fn run(field: agrisense::FieldProfile) -> agrisense::Result<()> {
//! let dispatcher = Arc::new(GeminiDispatcher::from_env()?);
//! let advisor = Advisor::new(dispatcher, agrisense::config::DEFAULT_MODEL);
//! let advice = advisor.recommend_crops(&field, &[]).await;
//! println!("{:?}", advice.value);
//! # Ok(())
//! # }
//! ```

pub mod advisory;
pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod router;

#[cfg(test)]
pub(crate) mod test_support;

pub use advisory::{
    Advice, AdviceSource, Advisor, CropRecommendation, FieldProfile, SensorKind, SensorReading,
    SoilHealthReport,
};
pub use api::Envelope;
pub use client::{ClientFactory, GeminiClient, GeminiFactory, GenerationClient};
pub use config::{DispatcherSettings, RotationMode, SettingsLoader};
pub use error::{AgrisenseError, ProviderError, Result};
pub use router::{Credential, CredentialSet, Dispatcher, DispatcherStats, RotationPolicy};

/// Dispatcher over the Gemini HTTP API
pub type GeminiDispatcher = Dispatcher<GeminiFactory>;

/// Build a Gemini dispatcher, reading keys from the configured variables
pub fn gemini_dispatcher(settings: &DispatcherSettings) -> GeminiDispatcher {
    let credentials =
        CredentialSet::from_env(settings.credential_env.as_slice(), settings.min_credential_length);
    if credentials.is_empty() {
        tracing::warn!(
            sources = ?settings.credential_env,
            "no usable API keys found; advice will fall back to defaults"
        );
    } else {
        tracing::info!(keys = credentials.len(), "gemini dispatcher ready");
    }

    let mut factory = GeminiFactory::new(settings.get_base_url());
    if let Some(timeout) = settings.request_timeout() {
        factory = factory.with_timeout(timeout);
    }

    Dispatcher::new(factory, credentials)
        .with_policy(settings.rotation_policy.into())
        .with_retry_delay(settings.retry_delay())
        .with_default_retries(settings.default_retries)
}

impl Dispatcher<GeminiFactory> {
    /// Load `.env`, settings files, and keys from the environment
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let settings = SettingsLoader::new()?.into_settings()?;
        Ok(gemini_dispatcher(&settings))
    }
}
