//! Generated Text Decoding
//!
//! Models often wrap JSON answers in markdown fences even when asked for raw
//! JSON. These helpers strip the fence and decode the payload.

use crate::error::{AgrisenseError, Result};
use serde::de::DeserializeOwned;

/// Remove a surrounding ```json / ``` fence and outer whitespace
pub fn strip_code_fences(raw: &str) -> &str {
    let text = raw.trim();

    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };

    // Drop the info string ("json", "JSON", ...) up to the first newline
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };

    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Decode generated text as JSON
pub fn parse_json<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let text = strip_code_fences(raw);
    serde_json::from_str(text).map_err(|e| {
        let excerpt: String = text.chars().take(200).collect();
        AgrisenseError::Response(format!(
            "Failed to parse generated JSON: {}. Text: {}",
            e, excerpt
        ))
    })
}
