//! Configuration Loader
//!
//! Loads dispatcher settings from built-in defaults and optional JSON files.
//! Keys set in a later file override the same keys from earlier sources.

use crate::config::settings::DispatcherSettings;
use crate::error::{AgrisenseError, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Configuration loader with support for multiple sources
pub struct SettingsLoader {
    merged: Map<String, Value>,
}

impl SettingsLoader {
    /// Create a new loader and load from default locations
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::discover(&cwd)
    }

    /// Defaults plus every config file found relative to `cwd`
    fn discover(cwd: &Path) -> Result<Self> {
        let mut loader = Self::with_defaults()?;
        loader.load_from_default_paths(cwd)?;
        Ok(loader)
    }

    /// Create a loader with a specific config file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let mut loader = Self::with_defaults()?;
        loader.load_from_file(path)?;
        Ok(loader)
    }

    fn with_defaults() -> Result<Self> {
        match serde_json::to_value(DispatcherSettings::default())? {
            Value::Object(merged) => Ok(Self { merged }),
            _ => Err(AgrisenseError::Internal(
                "default settings did not serialize to an object".to_string(),
            )),
        }
    }

    /// Load configuration from default paths
    fn load_from_default_paths(&mut self, cwd: &Path) -> Result<()> {
        for path in Self::get_config_paths(cwd) {
            if path.exists() {
                self.load_from_file(&path)?;
            }
        }
        Ok(())
    }

    /// Get list of config paths to check, lowest priority first
    fn get_config_paths(cwd: &Path) -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // User-wide locations
        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".agrisense").join("agrisense.json"));
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("agrisense").join("agrisense.json"));
        }

        // Current directory
        paths.push(cwd.join("agrisense.json"));

        // Explicit override wins
        if let Ok(custom_path) = std::env::var("AGRISENSE_CONFIG") {
            paths.push(PathBuf::from(custom_path));
        }

        paths
    }

    /// Load configuration from a specific file
    fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AgrisenseError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let value: Value = serde_json::from_str(&content).map_err(|e| {
            AgrisenseError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        let Value::Object(overrides) = value else {
            return Err(AgrisenseError::Config(format!(
                "{} must contain a JSON object",
                path.display()
            )));
        };

        tracing::debug!(path = %path.display(), keys = overrides.len(), "loaded settings file");
        self.merge(overrides);
        Ok(())
    }

    /// Merge another object into this one (later values override earlier)
    fn merge(&mut self, overrides: Map<String, Value>) {
        for (key, value) in overrides {
            self.merged.insert(key, value);
        }
    }

    /// Take ownership of the validated settings
    pub fn into_settings(self) -> Result<DispatcherSettings> {
        serde_json::from_value(Value::Object(self.merged))
            .map_err(|e| AgrisenseError::Config(format!("Invalid settings: {}", e)))
    }
}
