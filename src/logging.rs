use std::io;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Log to stderr so stdout stays clean for JSON output.
///
/// `RUST_LOG` overrides the default of `info` (`warn` with `--quiet`).
pub fn configure_logging(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let stderr_log = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_filter(filter);

    tracing_subscriber::registry().with(stderr_log).init();
}
