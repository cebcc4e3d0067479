//! # Meksikaner
//!
//! Session engine for a three-player trick-taking card game in the
//! Meksikaner style: matchmaking players into tables, shuffling and dealing
//! a 32-card deck, and running the bidding auction that decides who plays
//! the hand.
//!
//! ## Core Modules
//!
//! - [`game`]: cards, deck, dealer and the bidding state machine
//! - [`session`]: the [`SessionStore`](session::SessionStore) trait with
//!   PostgreSQL and in-memory implementations
//! - [`table`]: per-game actors and the [`GameManager`](table::GameManager)
//! - [`db`]: connection pooling, migrations and query timeouts
//!
//! ## Example
//!
//! ```
//! use meksikaner::game::{BidOption, BidOutcome, BidRound};
//!
//! let mut round = BidRound::new();
//! round.apply(0, "6".parse().unwrap()).unwrap();
//! round.apply(1, BidOption::Dalje).unwrap();
//! round.apply(2, "7".parse().unwrap()).unwrap();
//! let outcome = round.apply(0, BidOption::Dalje).unwrap();
//!
//! assert!(matches!(outcome, Some(BidOutcome::Won { seat: 2, .. })));
//! ```

/// Database connection and schema management.
pub mod db;

/// Cards, dealing and bidding rules.
pub mod game;
pub use game::{
    Bid, BidError, BidOption, BidOutcome, BidRound, Card, Deal, DealError,
    constants::{self, DECK_SIZE, HAND_SIZE, PLAYERS_PER_GAME, TALON_SIZE},
};

/// Durable game sessions.
pub mod session;
pub use session::{GameError, GameId, GameResult, SessionStore, UserId};

/// Game actors and manager.
pub mod table;
pub use table::{GameManager, SessionConfig};
