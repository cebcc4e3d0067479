//! Game session API handlers.
//!
//! HTTP endpoints for matchmaking, dealing and reading game state:
//! - Joining (or opening) a game
//! - Dealing cards once three players are seated
//! - Reading a game, a player's hand and the bidding round
//!
//! # Examples
//!
//! Join a game:
//! ```bash
//! curl -X POST http://localhost:6969/api/games \
//!   -H "Content-Type: application/json" \
//!   -d '{"userId": 42}'
//! ```

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use meksikaner::{
    BidError, Card, GameError,
    session::{Game, GameId, UserId},
    table::BiddingView,
};
use serde::{Deserialize, Serialize};

use super::{AppState, request_id::RequestId};
use crate::{logging, metrics};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinGameRequest {
    pub user_id: Option<UserId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinGameResponse {
    pub game_id: GameId,
    pub seat_index: usize,
    pub seat_count: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealCardsRequest {
    pub game_id: Option<GameId>,
}

#[derive(Debug, Serialize)]
pub struct DealCardsResponse {
    pub message: String,
    pub talon: Vec<Card>,
}

#[derive(Debug, Serialize)]
pub struct HandResponse {
    pub hand: Vec<Card>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(message: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

/// Map a session error onto a status code and client-safe body
///
/// Internal errors are logged with the request ID before their detail is
/// dropped from the response.
pub fn error_response(err: GameError, operation: &str, request_id: &RequestId) -> ApiError {
    let status = match &err {
        GameError::InvalidArgument(_) | GameError::InsufficientPlayers { .. } => {
            StatusCode::BAD_REQUEST
        }
        GameError::NotFound(_) => StatusCode::NOT_FOUND,
        GameError::AlreadyDealt(_) => StatusCode::CONFLICT,
        GameError::Bidding(BidError::NotSeated(_)) => StatusCode::FORBIDDEN,
        GameError::Bidding(BidError::Closed) => StatusCode::CONFLICT,
        GameError::Bidding(_) => StatusCode::BAD_REQUEST,
        GameError::Storage(_) | GameError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if err.is_internal() {
        logging::log_internal_error(request_id.as_str(), operation, &err.to_string());
    }

    (
        status,
        Json(ErrorResponse {
            error: err.client_message(),
        }),
    )
}

/// Join a waiting game or open a new one.
///
/// # Request Body
///
/// ```json
/// { "userId": 42 }
/// ```
///
/// # Response
///
/// `201 Created` when a new game was opened for the caller, `200 OK` when
/// they joined an existing one:
/// ```json
/// { "gameId": 7, "seatIndex": 1, "seatCount": 2 }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing or invalid `userId`
/// - `500 Internal Server Error`: Store failure
pub async fn join_game(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(request): Json<JoinGameRequest>,
) -> Result<(StatusCode, Json<JoinGameResponse>), ApiError> {
    let user_id = request.user_id.ok_or_else(|| bad_request("userId is required"))?;

    let outcome = state
        .game_manager
        .join_or_create(user_id)
        .await
        .map_err(|e| error_response(e, "join_game", &request_id))?;

    metrics::seats_joined_total();
    let status = if outcome.created {
        metrics::games_created_total();
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    metrics::active_games(state.game_manager.active_game_count().await);

    Ok((
        status,
        Json(JoinGameResponse {
            game_id: outcome.game_id,
            seat_index: outcome.seat_index,
            seat_count: outcome.seat_count,
        }),
    ))
}

/// Deal a full table and open bidding.
///
/// # Response
///
/// `200 OK` with the talon:
/// ```json
/// { "message": "Cards dealt", "talon": [{"suit": "♥", "value": "A"}, {"suit": "♣", "value": "7"}] }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing `gameId`, or fewer than three seats
/// - `404 Not Found`: Unknown game
/// - `409 Conflict`: Cards already dealt
/// - `500 Internal Server Error`: Store failure
pub async fn deal_cards(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(request): Json<DealCardsRequest>,
) -> Result<Json<DealCardsResponse>, ApiError> {
    let game_id = request.game_id.ok_or_else(|| bad_request("gameId is required"))?;

    let talon = state
        .game_manager
        .deal_cards(game_id)
        .await
        .map_err(|e| error_response(e, "deal_cards", &request_id))?;

    metrics::deals_total();
    metrics::active_games(state.game_manager.active_game_count().await);

    Ok(Json(DealCardsResponse {
        message: "Cards dealt".to_string(),
        talon,
    }))
}

/// Get a game's status and talon.
///
/// # Errors
///
/// - `404 Not Found`: Unknown game
pub async fn get_game(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(game_id): Path<GameId>,
) -> Result<Json<Game>, ApiError> {
    state
        .game_manager
        .store()
        .get_game(game_id)
        .await
        .map(Json)
        .map_err(|e| error_response(e, "get_game", &request_id))
}

/// Get one player's hand.
///
/// # Errors
///
/// - `404 Not Found`: The player holds no seat in the game
pub async fn get_hand(
    State(state): State<AppState>,
    request_id: RequestId,
    Path((game_id, user_id)): Path<(GameId, UserId)>,
) -> Result<Json<HandResponse>, ApiError> {
    let hand = state
        .game_manager
        .store()
        .get_hand(game_id, user_id)
        .await
        .map_err(|e| error_response(e, "get_hand", &request_id))?;

    Ok(Json(HandResponse { hand }))
}

/// Get the game's bidding round, live or finished.
///
/// # Errors
///
/// - `404 Not Found`: No cards have been dealt for the game
pub async fn get_bidding(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(game_id): Path<GameId>,
) -> Result<Json<BiddingView>, ApiError> {
    state
        .game_manager
        .bidding_view(game_id)
        .await
        .map(Json)
        .map_err(|e| error_response(e, "get_bidding", &request_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: GameError) -> StatusCode {
        error_response(err, "test", &RequestId("test".to_string())).0
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            status_of(GameError::InvalidArgument("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(GameError::InsufficientPlayers { seated: 2 }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(GameError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_of(GameError::AlreadyDealt(1)), StatusCode::CONFLICT);
        assert_eq!(
            status_of(GameError::Bidding(BidError::NotSeated(5))),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(GameError::Bidding(BidError::OutOfTurn {
                seat: 1,
                expected: 0
            })),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(GameError::Storage("pool timed out".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_storage_detail_is_hidden() {
        let (_, Json(body)) = error_response(
            GameError::Storage("relation games does not exist".into()),
            "test",
            &RequestId("test".to_string()),
        );
        assert_eq!(body.error, "Internal server error");
    }
}
