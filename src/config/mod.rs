//! Configuration Module
//!
//! Handles dispatcher settings loading and validation.

pub mod loader;
pub mod settings;

pub use loader::SettingsLoader;
pub use settings::{DispatcherSettings, RotationMode, DEFAULT_MODEL};
