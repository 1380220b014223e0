//! Structured logging setup
//!
//! Log output goes to stderr so `render` can write charts to stdout.
//! `PEERBENCH_LOG` takes standard `EnvFilter` directives.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "PEERBENCH_LOG";

/// Install the global subscriber. Safe to call more than once.
pub fn init(verbose: bool) {
    let fallback = if verbose { "peerbench=debug" } else { "info" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
