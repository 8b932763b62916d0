//! Process-wide `tracing` subscriber.

use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is unset or unparsable: our own events at
/// `info`, sqlx only at `warn` so per-statement query logs stay out of batch
/// output.
const DEFAULT_FILTER: &str = "info,sqlx=warn";

/// Install a compact `fmt` subscriber writing to stdout.
///
/// Must run once, before the first log line; both `serve` and
/// `carry-forward` call it from `main`.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    tracing::info!("Logging initialized");
}
