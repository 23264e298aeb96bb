//! Scripted generation backend for unit tests.

use crate::api::Envelope;
use crate::client::{ClientFactory, GenerationClient};
use crate::error::ProviderError;
use crate::router::{Credential, CredentialSet};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Barrier;

/// Held by tests that set `AGRISENSE_CONFIG`
pub static ENV_LOCK: Mutex<()> = parking_lot::const_mutex(());

/// What a scripted key answers with
#[derive(Debug, Clone)]
pub enum Outcome {
    Text(String),
    RateLimited,
    Status(u16, String),
}

impl Outcome {
    fn into_result(self) -> Result<String, ProviderError> {
        match self {
            Outcome::Text(text) => Ok(text),
            Outcome::RateLimited => Err(ProviderError::Status {
                status: 429,
                body: "Resource has been exhausted (e.g. check quota).".to_string(),
            }),
            Outcome::Status(status, body) => Err(ProviderError::Status { status, body }),
        }
    }
}

#[derive(Clone)]
struct Script {
    outcome: Outcome,
    gate: Option<Arc<Barrier>>,
}

#[derive(Default)]
struct Inner {
    scripts: Mutex<HashMap<String, Script>>,
    refused: Mutex<HashSet<String>>,
    contacted: Mutex<Vec<String>>,
    connects: AtomicUsize,
}

/// Factory whose clients answer from a per-key script and record every call
#[derive(Clone, Default)]
pub struct ScriptedFactory {
    inner: Arc<Inner>,
}

impl ScriptedFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call through `key` yields `outcome`
    pub fn always(self, key: &str, outcome: Outcome) -> Self {
        self.inner
            .scripts
            .lock()
            .insert(key.to_string(), Script { outcome, gate: None });
        self
    }

    /// Like `always`, but each call first waits on `gate`
    pub fn gated(self, key: &str, gate: Arc<Barrier>, outcome: Outcome) -> Self {
        self.inner.scripts.lock().insert(
            key.to_string(),
            Script {
                outcome,
                gate: Some(gate),
            },
        );
        self
    }

    /// Handle construction for `key` fails
    pub fn refuse_connect(self, key: &str) -> Self {
        self.inner.refused.lock().insert(key.to_string());
        self
    }

    /// Keys contacted, in call order
    pub fn contacted(&self) -> Vec<String> {
        self.inner.contacted.lock().clone()
    }

    /// Handles constructed so far
    pub fn connects(&self) -> usize {
        self.inner.connects.load(Ordering::SeqCst)
    }
}

impl ClientFactory for ScriptedFactory {
    type Client = ScriptedClient;

    fn connect(&self, credential: &Credential) -> Result<ScriptedClient, ProviderError> {
        if self.inner.refused.lock().contains(credential.value()) {
            return Err(ProviderError::Client("refused".to_string()));
        }
        self.inner.connects.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedClient {
            key: credential.value().to_string(),
            inner: Arc::clone(&self.inner),
        })
    }
}

pub struct ScriptedClient {
    key: String,
    inner: Arc<Inner>,
}

#[async_trait]
impl GenerationClient for ScriptedClient {
    async fn generate(&self, _envelope: &Envelope) -> Result<String, ProviderError> {
        self.inner.contacted.lock().push(self.key.clone());
        let script = self.inner.scripts.lock().get(&self.key).cloned();

        let Some(script) = script else {
            return Err(ProviderError::Response(format!("unscripted key {}", self.key)));
        };
        if let Some(gate) = &script.gate {
            gate.wait().await;
        }
        script.outcome.into_result()
    }
}

/// Credential set from literal keys, in order
pub fn credentials(keys: &[&str]) -> CredentialSet {
    keys.iter().map(|k| Credential::new(*k)).collect()
}
