//! Session data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::errors::GameError;
use crate::game::{Card, SeatIndex};

/// Game ID type
pub type GameId = i64;

/// User ID type (owned by the external identity service)
pub type UserId = i64;

/// Game lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Fewer than three seats filled
    Waiting,
    /// Table full, cards not (or no longer) dealt
    Dealing,
    /// Hands dealt, auction running
    Bidding,
    /// Auction won, trick play under way
    InProgress,
    Finished,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Waiting => "waiting",
            GameStatus::Dealing => "dealing",
            GameStatus::Bidding => "bidding",
            GameStatus::InProgress => "in_progress",
            GameStatus::Finished => "finished",
        }
    }

    /// Whether a talon may exist in this status.
    pub fn is_dealt(&self) -> bool {
        matches!(
            self,
            GameStatus::Bidding | GameStatus::InProgress | GameStatus::Finished
        )
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameStatus {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(GameStatus::Waiting),
            "dealing" => Ok(GameStatus::Dealing),
            "bidding" => Ok(GameStatus::Bidding),
            "in_progress" => Ok(GameStatus::InProgress),
            "finished" => Ok(GameStatus::Finished),
            other => Err(GameError::Storage(format!("Unknown game status {other:?}"))),
        }
    }
}

/// Seat join status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatStatus {
    Joined,
}

impl SeatStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeatStatus::Joined => "joined",
        }
    }
}

impl FromStr for SeatStatus {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "joined" => Ok(SeatStatus::Joined),
            other => Err(GameError::Storage(format!("Unknown seat status {other:?}"))),
        }
    }
}

/// One game (table) record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: GameId,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub status: GameStatus,
    pub seat_count: usize,
    #[serde(rename = "talonCards")]
    pub talon: Vec<Card>,
}

/// A player's place at a game
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    pub id: i64,
    pub game_id: GameId,
    pub user_id: UserId,
    pub seat_index: SeatIndex,
    pub status: SeatStatus,
    pub hand: Vec<Card>,
}

/// Result of a matchmaking request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinOutcome {
    pub game_id: GameId,
    pub seat_index: SeatIndex,
    /// Seats filled after this join
    pub seat_count: usize,
    /// True when the join opened a new game
    pub created: bool,
}

impl JoinOutcome {
    /// Whether this join filled the table.
    pub fn is_full(&self) -> bool {
        self.seat_count == crate::game::constants::PLAYERS_PER_GAME
    }
}
