//! Structured logging configuration.
//!
//! The engine logs through the `log` facade; `tracing-subscriber` picks those
//! records up alongside the server's own `tracing` events.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Levels come from `RUST_LOG`, defaulting to `info,sqlx=warn`.
///
/// # Example
///
/// ```no_run
/// use sd_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,hyper=warn"));

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

/// Log an operator-triggered mutation
///
/// # Example
///
/// ```
/// use sd_server::logging::log_operator_action;
///
/// log_operator_action("pair_round", Some(3), "round 2 paired");
/// ```
pub fn log_operator_action(action: &str, draft_id: Option<i64>, message: &str) {
    tracing::info!(
        action = action,
        draft_id = draft_id,
        "OPERATOR: {}",
        message
    );
}

/// Log a report, confirmation or override of a match result
pub fn log_result_event(kind: &str, draft_id: i64, match_id: u32, player: Option<i64>) {
    tracing::info!(
        kind = kind,
        draft_id = draft_id,
        match_id = match_id,
        player = player,
        "Match result event"
    );
}

/// Log performance metric
///
/// # Example
///
/// ```
/// use sd_server::logging::log_performance;
/// use std::time::Instant;
///
/// let start = Instant::now();
/// // ... pair a round ...
/// let duration = start.elapsed().as_millis() as u64;
/// log_performance("pair_round", duration, Some("draft 1"));
/// ```
pub fn log_performance(operation: &str, duration_ms: u64, metadata: Option<&str>) {
    if duration_ms > 1000 {
        tracing::warn!(
            operation = operation,
            duration_ms = duration_ms,
            metadata = metadata,
            "PERFORMANCE: Slow operation"
        );
    } else {
        tracing::debug!(
            operation = operation,
            duration_ms = duration_ms,
            metadata = metadata,
            "Performance metric"
        );
    }
}
