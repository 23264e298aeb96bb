//! Gemini Client
//!
//! HTTP client for the Gemini `generateContent` endpoint.

use crate::api::Envelope;
use crate::client::traits::{ClientFactory, GenerationClient};
use crate::error::ProviderError;
use crate::router::Credential;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Longest error body kept in a `ProviderError`
const MAX_ERROR_BODY: usize = 500;

/// Creates [`GeminiClient`] handles
#[derive(Debug, Clone)]
pub struct GeminiFactory {
    base_url: String,
    timeout: Option<Duration>,
}

impl GeminiFactory {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: None,
        }
    }

    /// Per-request timeout; without one the reqwest default applies
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Default for GeminiFactory {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ClientFactory for GeminiFactory {
    type Client = GeminiClient;

    fn connect(&self, credential: &Credential) -> Result<GeminiClient, ProviderError> {
        let mut key = HeaderValue::from_str(credential.value())
            .map_err(|e| ProviderError::Client(format!("Invalid API key format: {}", e)))?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(API_KEY_HEADER, key);

        let mut builder = Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(10));
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| ProviderError::Client(format!("Failed to create HTTP client: {}", e)))?;

        Ok(GeminiClient {
            client,
            base_url: self.base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// A Gemini HTTP client bound to one API key
#[derive(Debug)]
pub struct GeminiClient {
    /// Inner reqwest client, carrying the key as a default header
    client: Client,

    base_url: String,
}

impl GeminiClient {
    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate(&self, envelope: &Envelope) -> Result<String, ProviderError> {
        let body = GenerateContentRequest::from_envelope(envelope);

        let resp = self
            .client
            .post(self.endpoint(&envelope.model))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: text.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text).map_err(|e| {
            ProviderError::Response(format!(
                "Failed to parse response: {}. Body: {}",
                e,
                text.chars().take(MAX_ERROR_BODY).collect::<String>()
            ))
        })?;

        parsed.text().ok_or_else(|| {
            let reason = parsed
                .candidates
                .first()
                .and_then(|c| c.finish_reason.clone())
                .unwrap_or_else(|| "no candidates".to_string());
            ProviderError::Response(format!("Response carried no text ({})", reason))
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,

    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<&'a serde_json::Value>,
}

impl<'a> GenerateContentRequest<'a> {
    fn from_envelope(envelope: &'a Envelope) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part {
                    text: &envelope.prompt,
                }],
            }],
            system_instruction: envelope.system_instruction.as_deref().map(|text| Content {
                role: None,
                parts: vec![Part { text }],
            }),
            generation_config: GenerationConfig {
                temperature: envelope.temperature,
                response_mime_type: envelope.expects_json().then_some("application/json"),
                response_schema: envelope.response_schema.as_ref(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.is_empty()).then_some(text)
    }
}
