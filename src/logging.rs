//! Diagnostic logging to stderr.
//!
//! Command output goes to stdout with `println!`; everything emitted through
//! `tracing` goes to stderr so piping results stays clean.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber. Call once, from `main`. `RUST_LOG` is honoured unless `verbose`
/// forces `debug`; the default level is `warn`.
pub fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}
