//! Observability utilities.

mod timer;

pub use timer::SpanTimer;

use tracing_subscriber::EnvFilter;

/// Installs a formatting subscriber filtered by `filter`, unless `RUST_LOG`
/// is set, in which case that wins.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_tracing(filter: &str) -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
