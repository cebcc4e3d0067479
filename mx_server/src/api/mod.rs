//! HTTP/WebSocket API for Meksikaner game sessions.
//!
//! # Modules
//!
//! - [`games`]: Matchmaking, dealing and game state reads
//! - [`websocket`]: Real-time bidding channel per game
//! - [`rate_limiter`]: Per-connection message limits
//! - [`request_id`]: Request correlation middleware
//!
//! # Endpoints Overview
//!
//! ```text
//! GET  /health                                   - Store health
//! POST /api/games                                - Join or open a game
//! POST /api/games/deal-cards                     - Deal a full table
//! GET  /api/games/{gameId}                       - Game status and talon
//! GET  /api/games/{gameId}/player/{userId}/hand  - One player's hand
//! GET  /api/games/{gameId}/bidding               - Bidding round
//! GET  /ws/{gameId}?user_id=N                    - WebSocket
//! ```
//!
//! Request and response bodies are JSON with camelCase fields; errors are
//! `{"error": "<message>"}`.
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod games;
pub mod rate_limiter;
pub mod request_id;
pub mod websocket;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use meksikaner::GameManager;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers and WebSocket connections.
///
/// Cloned per request; the game manager is itself a cheap handle.
#[derive(Clone)]
pub struct AppState {
    pub game_manager: Arc<GameManager>,
}

impl AppState {
    pub fn new(game_manager: GameManager) -> Self {
        Self {
            game_manager: Arc::new(game_manager),
        }
    }
}

/// Create the complete API router with all endpoints and middleware.
///
/// # Arguments
///
/// - `state`: Application state with the game manager
///
/// # Returns
///
/// Configured Axum router ready to serve requests
///
/// # Example
///
/// ```rust,no_run
/// use meksikaner::{GameManager, SessionConfig, session::MemorySessionStore};
/// use mx_server::api::{AppState, create_router};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let manager = GameManager::new(Arc::new(MemorySessionStore::new()), SessionConfig::default());
/// let app = create_router(AppState::new(manager));
/// let listener = tokio::net::TcpListener::bind("127.0.0.1:6969").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```
pub fn create_router(state: AppState) -> Router {
    let game_routes = Router::new()
        .route("/", post(games::join_game))
        .route("/deal-cards", post(games::deal_cards))
        .route("/{game_id}", get(games::get_game))
        .route("/{game_id}/player/{user_id}/hand", get(games::get_hand))
        .route("/{game_id}/bidding", get(games::get_bidding));

    Router::new()
        .route("/health", get(health_check))
        .route("/ws/{game_id}", get(websocket::websocket_handler))
        .nest("/api/games", game_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the session store answers, `503 Service
/// Unavailable` otherwise.
///
/// ```bash
/// curl http://localhost:6969/health
/// # {"status":"healthy","store":true,"games":{"active_count":2},"timestamp":"2026-03-01T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let store_healthy = state.game_manager.store().health_check().await.is_ok();
    let active_count = state.game_manager.active_game_count().await;

    let status_code = if store_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if store_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "store": store_healthy,
        "games": {
            "active_count": active_count
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
