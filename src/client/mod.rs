//! Client Module
//!
//! Generation client traits, the Gemini HTTP client, and failure classification.

pub mod classifier;
pub mod gemini;
pub mod traits;

pub use gemini::{GeminiClient, GeminiFactory};
pub use traits::{ClientFactory, GenerationClient};
