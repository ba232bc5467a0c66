//! Tracing subscriber setup for the binary

use std::sync::Once;

use tracing_subscriber::{fmt, EnvFilter};

static TRACING_INIT: Once = Once::new();

/// Install the global subscriber once
///
/// `RUST_LOG` wins when set. Otherwise this crate logs at `info`, raised to
/// `debug` and `trace` by repeated `-v`. Output goes to stderr so command
/// output on stdout stays clean.
pub fn init_tracing(verbose: u8) {
    TRACING_INIT.call_once(|| {
        let level = match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("receipt_ledger={}", level)));

        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    });
}
