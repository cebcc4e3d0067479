//! Durable game sessions: matchmaking, seats, hands and bidding rounds.
//!
//! [`SessionStore`] is the seam between the game actors and storage.
//! [`PgSessionStore`] is the production implementation and
//! [`MemorySessionStore`] mirrors it in process memory.

pub mod errors;
pub mod memory;
pub mod models;
pub mod store;

pub use errors::{GameError, GameResult};
pub use memory::MemorySessionStore;
pub use models::{Game, GameId, GameStatus, JoinOutcome, Seat, SeatStatus, UserId};
pub use store::{PgSessionStore, SessionStore};
