//! Logging setup
//!
//! Library code only emits `tracing` events. Binaries and tests that want to
//! see them call [`init`] once.

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber filtered by `RUST_LOG` (default `info`)
///
/// Returns `false` if a global subscriber was already installed.
pub fn init() -> bool {
    init_with_default("info")
}

/// Same as [`init`] with a custom fallback filter
pub fn init_with_default(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
