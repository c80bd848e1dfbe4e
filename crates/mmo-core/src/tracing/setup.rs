//! Tracing initialization and configuration.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::constants::{DEFAULT_LOG_FILTER, LOG_ENV_VAR};

static INIT: Once = Once::new();

/// Initialize the MMO tracing/logging system.
///
/// Reads `MMO_LOG` for per-module log levels, e.g.
/// `MMO_LOG=mmo_gates::evaluator=trace,mmo_gates=debug`.
///
/// Falls back to `mmo=info` if `MMO_LOG` is not set or is invalid.
/// Output goes to stderr so annotated reports can be piped from stdout.
///
/// This function is idempotent.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter)
            .try_init();
    });
}
