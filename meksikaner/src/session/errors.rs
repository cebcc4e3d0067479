//! Session error types.

use thiserror::Error;

use super::models::GameId;
use crate::{
    db::timeouts::TimeoutError,
    game::{BidError, DealError},
};

/// Session errors
#[derive(Debug, Error)]
pub enum GameError {
    /// Caller supplied a missing or malformed argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Game, seat or round does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Fewer than three seats filled
    #[error("Not enough players: {seated} seated")]
    InsufficientPlayers { seated: usize },

    /// Cards were already dealt for this game
    #[error("Cards already dealt for game {0}")]
    AlreadyDealt(GameId),

    /// Bidding protocol violation
    #[error(transparent)]
    Bidding(#[from] BidError),

    /// Store failure other than a raw database error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl GameError {
    /// Get a client-safe error message
    ///
    /// Storage and database errors are replaced with a generic message so
    /// no store detail reaches the client; callers log the full error.
    pub fn client_message(&self) -> String {
        match self {
            GameError::Database(_) | GameError::Storage(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Whether the error comes from the store rather than the caller.
    pub fn is_internal(&self) -> bool {
        matches!(self, GameError::Database(_) | GameError::Storage(_))
    }
}

impl From<DealError> for GameError {
    fn from(err: DealError) -> Self {
        match err {
            DealError::InsufficientPlayers { seated } => GameError::InsufficientPlayers { seated },
            DealError::InvalidDeck(_) => GameError::Storage(err.to_string()),
        }
    }
}

impl From<TimeoutError> for GameError {
    fn from(err: TimeoutError) -> Self {
        GameError::Storage(err.to_string())
    }
}

/// Result type for session operations
pub type GameResult<T> = Result<T, GameError>;
