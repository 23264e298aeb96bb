//! API Module
//!
//! Request envelope and generated-text decoding.

pub mod envelope;
pub mod response;

pub use envelope::Envelope;
pub use response::{parse_json, strip_code_fences};
