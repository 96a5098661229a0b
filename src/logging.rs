//! Logging configuration for loanlens.
//!
//! Logs go to stderr so stdout stays clean for tooling that wraps the
//! binary. `RUST_LOG` overrides the level; `--verbose` lowers the
//! default to debug.

use tracing_subscriber::EnvFilter;

/// Initializes stderr logging.
///
/// `RUST_LOG` takes precedence when set. Without it, the default level
/// is `info`, or `debug` when `verbose` is requested.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}
