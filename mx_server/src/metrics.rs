//! Prometheus metrics for game sessions.
//!
//! Metrics are exposed in Prometheus text format on a separate listener
//! when `METRICS_BIND` is set. Without an installed recorder every call
//! here is a no-op.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use mx_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::games_created_total();
//! metrics::active_games(3);
//! ```

use meksikaner::BidOutcome;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
///
/// # Arguments
///
/// - `addr`: Address to bind the metrics server to (e.g., `0.0.0.0:9090`)
///
/// # Returns
///
/// Result indicating success or error message
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// Session Metrics
// ============================================================================

/// A join opened a new game.
pub fn games_created_total() {
    ::metrics::counter!("games_created_total").increment(1);
}

/// A player took a seat, new game or not.
pub fn seats_joined_total() {
    ::metrics::counter!("seats_joined_total").increment(1);
}

pub fn deals_total() {
    ::metrics::counter!("deals_total").increment(1);
}

/// Record a bid by whether the game accepted it.
pub fn bids_total(accepted: bool) {
    ::metrics::counter!("bids_total",
        "accepted" => accepted.to_string()
    )
    .increment(1);
}

/// Record how a bidding round ended.
pub fn rounds_resolved_total(outcome: &BidOutcome) {
    let label = match outcome {
        BidOutcome::Won { .. } => "won",
        BidOutcome::Void => "void",
    };
    ::metrics::counter!("rounds_resolved_total", "outcome" => label).increment(1);
}

/// Set current running game actors.
pub fn active_games(count: usize) {
    ::metrics::gauge!("active_games").set(count as f64);
}

// ============================================================================
// WebSocket Metrics
// ============================================================================

/// Track a WebSocket opening (`+1`) or closing (`-1`).
pub fn websocket_connections_active(delta: f64) {
    ::metrics::gauge!("websocket_connections_active").increment(delta);
}

pub fn websocket_connections_total() {
    ::metrics::counter!("websocket_connections_total").increment(1);
}

pub fn websocket_messages_sent() {
    ::metrics::counter!("websocket_messages_sent").increment(1);
}

pub fn websocket_messages_received() {
    ::metrics::counter!("websocket_messages_received").increment(1);
}

/// Increment rate limit hits counter.
pub fn rate_limit_hits_total(window: &'static str) {
    ::metrics::counter!("rate_limit_hits_total", "window" => window).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use meksikaner::Bid;

    #[test]
    fn test_recording_without_exporter_is_noop() {
        games_created_total();
        seats_joined_total();
        deals_total();
        bids_total(true);
        bids_total(false);
        rounds_resolved_total(&BidOutcome::Won {
            seat: 0,
            bid: Bid::Meksiko,
        });
        rounds_resolved_total(&BidOutcome::Void);
        active_games(2);
        websocket_connections_active(1.0);
        websocket_connections_active(-1.0);
        rate_limit_hits_total("burst");
    }
}
