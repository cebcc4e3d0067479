//! Structured logging setup and shared log events.
//!
//! The library logs through the `log` facade; the subscriber installed here
//! picks those records up alongside the server's own `tracing` events.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info,sqlx=warn,hyper=warn";

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var.
///
/// # Example
///
/// ```no_run
/// use mx_server::logging;
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

/// Log a bid the game refused
///
/// # Arguments
///
/// * `game_id` - Game the bid targeted
/// * `user_id` - Bidding user
/// * `reason` - Why it was refused
pub fn log_bid_rejected(game_id: i64, user_id: i64, reason: &str) {
    tracing::info!(
        game_id = game_id,
        user_id = user_id,
        reason = reason,
        "Bid rejected"
    );
}

/// Log an internal failure whose detail is hidden from the client
pub fn log_internal_error(request_id: &str, operation: &str, detail: &str) {
    tracing::error!(
        request_id = request_id,
        operation = operation,
        detail = detail,
        "Internal error"
    );
}
