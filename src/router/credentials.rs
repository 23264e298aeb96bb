//! API Key Collection
//!
//! Gathers API keys from prioritized sources once at startup and keeps them in
//! a fixed, ordered set.

use std::fmt;

/// Primary key variable, then two numbered fallbacks
pub const DEFAULT_CREDENTIAL_ENV: [&str; 3] =
    ["GEMINI_API_KEY", "GEMINI_API_KEY_2", "GEMINI_API_KEY_3"];

/// Anything shorter is treated as a placeholder
pub const DEFAULT_MIN_CREDENTIAL_LENGTH: usize = 10;

/// A single API key
///
/// `Debug` and `Display` only show a short prefix so keys never end up in logs.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw key value
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the key value
    pub fn value(&self) -> &str {
        &self.0
    }

    fn redacted(&self) -> String {
        let prefix: String = self.0.chars().take(4).collect();
        format!("{}…", prefix)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.redacted()).finish()
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

/// Ordered, de-duplicated set of usable keys
#[derive(Debug, Clone, Default)]
pub struct CredentialSet {
    credentials: Vec<Credential>,
}

impl CredentialSet {
    /// Build a set from candidates in priority order
    ///
    /// Missing entries, entries shorter than `min_len` after trimming, and
    /// repeats of an earlier key are dropped. The result may be empty.
    pub fn from_sources<I>(candidates: I, min_len: usize) -> Self
    where
        I: IntoIterator<Item = Option<String>>,
    {
        let mut credentials: Vec<Credential> = Vec::new();

        for candidate in candidates.into_iter().flatten() {
            let trimmed = candidate.trim();
            if trimmed.is_empty() || trimmed.chars().count() < min_len {
                continue;
            }
            let credential = Credential::new(trimmed);
            if !credentials.contains(&credential) {
                credentials.push(credential);
            }
        }

        Self { credentials }
    }

    /// Read each named environment variable once
    pub fn from_env<S: AsRef<str>>(var_names: &[S], min_len: usize) -> Self {
        let set = Self::from_sources(
            var_names.iter().map(|name| std::env::var(name.as_ref()).ok()),
            min_len,
        );
        tracing::debug!(
            sources = var_names.len(),
            usable = set.len(),
            "loaded API keys from environment"
        );
        set
    }

    /// Check if the set is empty
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    /// Get the number of keys in the set
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    /// Key at a cursor position
    pub fn get(&self, index: usize) -> Option<&Credential> {
        self.credentials.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Credential> {
        self.credentials.iter()
    }
}

impl FromIterator<Credential> for CredentialSet {
    fn from_iter<T: IntoIterator<Item = Credential>>(iter: T) -> Self {
        let mut credentials: Vec<Credential> = Vec::new();
        for credential in iter {
            if !credentials.contains(&credential) {
                credentials.push(credential);
            }
        }
        Self { credentials }
    }
}
