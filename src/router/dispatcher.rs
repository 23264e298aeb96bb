//! Multi-key Dispatcher
//!
//! Sends one logical generation request through the active API key and, when
//! an attempt fails with a retryable error, rotates to the next key and tries
//! again until the retry budget runs out.
//!
//! The cursor and the client cache live behind a single mutex that is never
//! held across an await. Rotation is compare-and-advance: a failed attempt only
//! moves the cursor if it still points at the key that attempt used, so
//! concurrent callers failing on the same key rotate past it once.

use crate::api::Envelope;
use crate::client::{ClientFactory, GenerationClient};
use crate::error::{AgrisenseError, ProviderError, Result};
use crate::router::credentials::{Credential, CredentialSet};
use crate::router::policy::RotationPolicy;
use backoff::backoff::{Backoff, Constant};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Retries after the first failed attempt, unless overridden
pub const DEFAULT_RETRIES: u32 = 2;

struct DispatchState<C> {
    /// Index of the active key
    cursor: usize,

    /// One handle per key value, created on first use
    clients: HashMap<Credential, Arc<C>>,
}

/// Usage counters for one key
#[derive(Debug, Default)]
struct KeyUsage {
    attempts: AtomicU64,
    failures: AtomicU64,
}

/// Routes generation requests across a fixed set of API keys
pub struct Dispatcher<F: ClientFactory> {
    factory: F,
    credentials: CredentialSet,
    state: Mutex<DispatchState<F::Client>>,
    usage: Vec<KeyUsage>,
    rotations: AtomicU64,
    policy: RotationPolicy,
    retry_delay: Duration,
    default_retries: u32,
}

impl<F: ClientFactory> Dispatcher<F> {
    /// Create a dispatcher; an empty credential set is accepted and reported
    /// on the first dispatch
    pub fn new(factory: F, credentials: CredentialSet) -> Self {
        let usage = credentials.iter().map(|_| KeyUsage::default()).collect();
        Self {
            factory,
            credentials,
            state: Mutex::new(DispatchState {
                cursor: 0,
                clients: HashMap::new(),
            }),
            usage,
            rotations: AtomicU64::new(0),
            policy: RotationPolicy::default(),
            retry_delay: Duration::ZERO,
            default_retries: DEFAULT_RETRIES,
        }
    }

    pub fn with_policy(mut self, policy: RotationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Flat pause between a failed attempt and its retry
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_default_retries(mut self, retries: u32) -> Self {
        self.default_retries = retries;
        self
    }

    /// Dispatch with the default retry budget
    pub async fn dispatch(&self, envelope: &Envelope) -> Result<String> {
        self.dispatch_with_retries(envelope, self.default_retries).await
    }

    /// Dispatch, allowing up to `retries` further attempts after the first
    ///
    /// Returns the generated text unmodified. Terminal errors:
    /// - [`AgrisenseError::NoCredentials`] before any attempt when no key is configured
    /// - [`AgrisenseError::NonRetryable`] as soon as the policy rejects a failure
    /// - [`AgrisenseError::RetriesExhausted`] with the last failure after `retries + 1` attempts
    pub async fn dispatch_with_retries(&self, envelope: &Envelope, retries: u32) -> Result<String> {
        if self.credentials.is_empty() {
            tracing::warn!("dispatch requested with no usable API keys");
            return Err(AgrisenseError::NoCredentials);
        }

        let mut pause = Constant::new(self.retry_delay);

        for attempt in 0..=retries {
            let (index, client) = self.active_client()?;
            self.usage[index].attempts.fetch_add(1, Ordering::Relaxed);

            tracing::debug!(
                attempt = attempt + 1,
                key_index = index,
                model = %envelope.model,
                "sending generation request"
            );

            let outcome = match client {
                Ok(client) => client.generate(envelope).await,
                Err(err) => Err(err),
            };

            let err = match outcome {
                Ok(text) => return Ok(text),
                Err(err) => err,
            };
            self.usage[index].failures.fetch_add(1, Ordering::Relaxed);

            if !self.policy.should_rotate(&err) {
                tracing::warn!(key_index = index, error = %err, "non-retryable generation failure");
                return Err(AgrisenseError::NonRetryable {
                    credential: index,
                    source: err,
                });
            }

            if attempt == retries {
                tracing::warn!(
                    attempts = retries + 1,
                    error = %err,
                    "generation retries exhausted"
                );
                return Err(AgrisenseError::RetriesExhausted {
                    attempts: retries + 1,
                    source: err,
                });
            }

            let next = self.rotate_from(index);
            tracing::warn!(
                failed_key = index,
                next_key = next,
                remaining = retries - attempt,
                error = %err,
                "rotating API key after failure"
            );

            if let Some(wait) = pause.next_backoff().filter(|d| !d.is_zero()) {
                tokio::time::sleep(wait).await;
            }
        }

        Err(AgrisenseError::Internal("retry loop ended without an outcome".to_string()))
    }

    /// Look up or lazily create the handle for the key at the cursor
    ///
    /// A handle that fails to build is reported as that attempt's failure.
    fn active_client(
        &self,
    ) -> Result<(usize, std::result::Result<Arc<F::Client>, ProviderError>)> {
        let mut state = self.state.lock();
        let index = state.cursor;
        let credential = self.credentials.get(index).ok_or_else(|| {
            AgrisenseError::Internal(format!("cursor {} outside key set", index))
        })?;

        if let Some(client) = state.clients.get(credential) {
            return Ok((index, Ok(Arc::clone(client))));
        }

        match self.factory.connect(credential) {
            Ok(client) => {
                tracing::debug!(key = %credential, "created client handle");
                let client = Arc::new(client);
                state.clients.insert(credential.clone(), Arc::clone(&client));
                Ok((index, Ok(client)))
            }
            Err(err) => Ok((index, Err(err))),
        }
    }

    /// Advance past `observed` unless another caller already has
    fn rotate_from(&self, observed: usize) -> usize {
        let mut state = self.state.lock();
        if state.cursor == observed {
            let next = (observed + 1) % self.credentials.len();
            if next != observed {
                self.rotations.fetch_add(1, Ordering::Relaxed);
            }
            state.cursor = next;
        }
        state.cursor
    }

    /// Index of the active key
    pub fn cursor(&self) -> usize {
        self.state.lock().cursor
    }

    pub fn credential_count(&self) -> usize {
        self.credentials.len()
    }

    /// Number of client handles created so far
    pub fn cached_clients(&self) -> usize {
        self.state.lock().clients.len()
    }

    /// Get statistics about the dispatcher
    pub fn stats(&self) -> DispatcherStats {
        let (cursor, cached_clients) = {
            let state = self.state.lock();
            (state.cursor, state.clients.len())
        };

        DispatcherStats {
            total_keys: self.credentials.len(),
            cursor,
            cached_clients,
            rotations: self.rotations.load(Ordering::Relaxed),
            keys: self
                .usage
                .iter()
                .map(|u| KeyStats {
                    attempts: u.attempts.load(Ordering::Relaxed),
                    failures: u.failures.load(Ordering::Relaxed),
                })
                .collect(),
        }
    }
}

/// Statistics about a dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherStats {
    pub total_keys: usize,
    pub cursor: usize,
    pub cached_clients: usize,
    pub rotations: u64,
    /// Per-key counters, in key order
    pub keys: Vec<KeyStats>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyStats {
    pub attempts: u64,
    pub failures: u64,
}
