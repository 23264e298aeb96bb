//! Generation Request Envelope
//!
//! The caller-built payload for a single generation call. The dispatcher
//! treats it as opaque and only borrows it for the duration of a call.

use serde::{Deserialize, Serialize};

/// Generation parameters for one logical request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Model identifier (e.g. "gemini-2.0-flash")
    pub model: String,

    /// User prompt text
    pub prompt: String,

    /// Optional system instruction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,

    /// Structured-output schema the response should follow
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<serde_json::Value>,

    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl Envelope {
    /// Create a new envelope
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system_instruction: None,
            response_schema: None,
            temperature: None,
        }
    }

    /// Set the system instruction
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    /// Request structured JSON output matching `schema`
    pub fn with_schema(mut self, schema: serde_json::Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Whether the caller expects JSON back
    pub fn expects_json(&self) -> bool {
        self.response_schema.is_some()
    }
}
