//! Structured logging configuration.
//!
//! The engine crate logs through the `log` facade; the subscriber installed
//! here also collects those records so both end up in one stream.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "info,sqlx=warn,hyper=warn";

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var.
///
/// # Example
///
/// ```no_run
/// use at_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a tournament operation that took noticeably long
///
/// Generation and recomputation run inside a row lock, so slow calls are
/// worth surfacing.
pub fn log_operation(operation: &str, tournament_id: i64, duration_ms: u64) {
    if duration_ms > 1000 {
        tracing::warn!(
            operation = operation,
            tournament_id = tournament_id,
            duration_ms = duration_ms,
            "Slow tournament operation"
        );
    } else {
        tracing::debug!(
            operation = operation,
            tournament_id = tournament_id,
            duration_ms = duration_ms,
            "Tournament operation"
        );
    }
}
