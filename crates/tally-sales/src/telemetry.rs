//! Tracing bootstrap.

use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber, honouring `RUST_LOG` and defaulting
/// to `info`. Calling it again is a no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .try_init();
}
