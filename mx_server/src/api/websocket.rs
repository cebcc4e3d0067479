//! WebSocket handler for real-time bidding.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws/{game_id}?user_id=N`
//! 2. Server subscribes the connection to the game's events, refusing
//!    users without a seat, then upgrades. Events:
//!    - `playerJoined` while seats are filling
//!    - `bidding` with the full round state after every transition
//!    - `resolved` when the auction ends, `redealt` after a void round
//! 3. Client bids are forwarded to the game actor; refusals come back to
//!    the sender only as `{"type":"error","message":...}`
//! 4. On disconnect the subscription is dropped
//!
//! # Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:6969/ws/7?user_id=42');
//!
//! ws.onmessage = (event) => {
//!   const data = JSON.parse(event.data);
//!   if (data.type === 'bidding' && data.turnUserId === 42) {
//!     showOptions(data.options);
//!   }
//! };
//!
//! ws.send(JSON.stringify({ type: 'playerBid', roundId: 7, userId: 42, bid: '7' }));
//! ```

use axum::{
    Json,
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use log::{error, info, warn};
use meksikaner::{
    BidOption,
    session::{GameId, UserId},
    table::{GameEvent, SubscriptionId},
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::{
    AppState,
    games::{ErrorResponse, error_response},
    rate_limiter::MessageLimiter,
    request_id::RequestId,
};
use crate::{logging, metrics};

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    user_id: Option<UserId>,
}

/// Client messages received via WebSocket
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
enum ClientMessage {
    /// A bid (`"5"`..`"10"`, `"Meksiko"`) or a pass (`"Dalje"`)
    PlayerBid {
        round_id: GameId,
        user_id: UserId,
        bid: BidOption,
    },
}

/// Replies addressed to one connection
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerResponse {
    Error { message: String },
}

impl ServerResponse {
    fn error(message: impl Into<String>) -> Self {
        ServerResponse::Error {
            message: message.into(),
        }
    }
}

/// Upgrade HTTP connection to WebSocket for a game's events.
///
/// The subscription is registered before the upgrade completes, so no event
/// published after the handshake is missed.
///
/// # Query Parameters
///
/// - `user_id`: Seated user the connection acts for
///
/// # Response
///
/// `101 Switching Protocols` on success. Before upgrading:
/// - `400 Bad Request`: Missing `user_id`
/// - `403 Forbidden`: User holds no seat in the game
/// - `404 Not Found`: Unknown game
/// - `409 Conflict`: Bidding already finished
pub async fn websocket_handler(
    Path(game_id): Path<GameId>,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
    request_id: RequestId,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let Some(user_id) = query.user_id else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "user_id is required".to_string(),
            }),
        )
            .into_response();
    };

    let (event_tx, event_rx) =
        mpsc::channel::<GameEvent>(state.game_manager.config().channel_capacity);

    let subscription = match state
        .game_manager
        .subscribe(game_id, user_id, event_tx)
        .await
    {
        Ok(subscription) => subscription,
        Err(e) => {
            warn!("Game {}: subscription for user {} refused: {}", game_id, user_id, e);
            return error_response(e, "subscribe", &request_id).into_response();
        }
    };

    match ws {
        Ok(ws) => ws.on_upgrade(move |socket| {
            handle_socket(socket, game_id, user_id, subscription, event_rx, state)
        }),
        Err(rejection) => {
            state.game_manager.unsubscribe(game_id, subscription).await;
            rejection.into_response()
        }
    }
}

/// Drive one established connection until either side closes it.
///
/// # Arguments
///
/// - `socket`: The WebSocket connection
/// - `game_id`: Game the connection watches
/// - `user_id`: Seated user the connection acts for
/// - `subscription`: Id of this connection's subscription
/// - `event_rx`: The connection's game event subscription
/// - `state`: Shared application state
async fn handle_socket(
    socket: WebSocket,
    game_id: GameId,
    user_id: UserId,
    subscription: SubscriptionId,
    mut event_rx: mpsc::Receiver<GameEvent>,
    state: AppState,
) {
    let (mut sender, mut receiver) = socket.split();

    info!("WebSocket connected: game={}, user={}", game_id, user_id);
    metrics::websocket_connections_total();
    metrics::websocket_connections_active(1.0);

    // Replies to this connection only
    let (response_tx, mut response_rx) = mpsc::channel::<String>(32);

    let send_task = tokio::spawn(async move {
        loop {
            let json = tokio::select! {
                Some(event) = event_rx.recv() => match serde_json::to_string(&event) {
                    Ok(json) => json,
                    Err(e) => {
                        error!("Failed to serialize game event: {}", e);
                        continue;
                    }
                },
                Some(json) = response_rx.recv() => json,
                else => break,
            };

            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
            metrics::websocket_messages_sent();
        }
    });

    let mut limiter = MessageLimiter::default();

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                metrics::websocket_messages_received();

                let response = match limiter.admit() {
                    Err(exceeded) => {
                        warn!(
                            "{} rate limit exceeded for user {} (game {}). Blocking message.",
                            exceeded.window(),
                            user_id,
                            game_id
                        );
                        metrics::rate_limit_hits_total(exceeded.window());
                        Some(ServerResponse::error(exceeded.message()))
                    }
                    Ok(()) => match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(client_msg) => {
                            handle_client_message(client_msg, game_id, user_id, &state).await
                        }
                        Err(e) => {
                            warn!("Failed to parse client message: {}", e);
                            Some(ServerResponse::error("Invalid message format"))
                        }
                    },
                };

                if let Some(response) = response
                    && let Ok(json) = serde_json::to_string(&response)
                    && response_tx.send(json).await.is_err()
                {
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                info!("WebSocket closed: game={}, user={}", game_id, user_id);
                break;
            }
            Err(e) => {
                error!("WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }

    send_task.abort();
    state.game_manager.unsubscribe(game_id, subscription).await;
    metrics::websocket_connections_active(-1.0);

    info!("WebSocket disconnected: game={}, user={}", game_id, user_id);
}

/// Process a client message, returning a reply when the sender needs one.
///
/// Accepted bids get no direct reply: the resulting `bidding` or
/// `resolved` event reaches every subscriber, the sender included.
async fn handle_client_message(
    msg: ClientMessage,
    game_id: GameId,
    user_id: UserId,
    state: &AppState,
) -> Option<ServerResponse> {
    match msg {
        ClientMessage::PlayerBid {
            round_id,
            user_id: claimed_user,
            bid,
        } => {
            if round_id != game_id {
                return Some(ServerResponse::error(format!(
                    "Round {round_id} does not belong to game {game_id}"
                )));
            }
            if claimed_user != user_id {
                return Some(ServerResponse::error(
                    "userId does not match this connection",
                ));
            }

            match state.game_manager.place_bid(game_id, user_id, bid).await {
                Ok(view) => {
                    metrics::bids_total(true);
                    if let Some(outcome) = &view.outcome {
                        metrics::rounds_resolved_total(outcome);
                        info!("Game {}: bidding resolved: {:?}", game_id, outcome);
                    }
                    metrics::active_games(state.game_manager.active_game_count().await);
                    None
                }
                Err(e) => {
                    metrics::bids_total(false);
                    if e.is_internal() {
                        error!("Game {}: bid from user {} failed: {}", game_id, user_id, e);
                    } else {
                        logging::log_bid_rejected(game_id, user_id, &e.to_string());
                    }
                    Some(ServerResponse::error(e.client_message()))
                }
            }
        }
    }
}
