//! Tracing initialisation for the `gcts` binary.
//!
//! Log output always goes to stderr. Stdout carries only command results, so
//! a parent `gcts rollback-commit` can capture a child `gcts deploy-commit`
//! without log lines mixed in.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter from `RUST_LOG`, or `level` when it is unset or invalid.
fn log_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}

/// Install the global subscriber: human-readable lines, or newline-delimited
/// JSON when `json` is set, both on stderr.
///
/// Only the first call in a process takes effect.
pub fn init_tracing(json: bool, level: Level) {
    let registry = tracing_subscriber::registry().with(log_filter(level));
    let layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let installed = if json {
        registry.with(layer.json()).try_init()
    } else {
        registry.with(layer).try_init()
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
