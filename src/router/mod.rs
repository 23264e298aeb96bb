//! Router Module
//!
//! API key collection, rotation policy, and the multi-key dispatcher.

pub mod credentials;
pub mod dispatcher;
pub mod policy;

pub use credentials::{Credential, CredentialSet};
pub use dispatcher::{Dispatcher, DispatcherStats, KeyStats, DEFAULT_RETRIES};
pub use policy::{RetryPredicate, RotationPolicy};
