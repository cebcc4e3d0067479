//! Game actors and the manager that owns them.
//!
//! ## Architecture
//!
//! Each game in bidding runs a [`GameActor`] in its own Tokio task with an
//! mpsc inbox, so bids on one game are applied strictly one at a time while
//! different games never wait on each other. The [`GameManager`] performs
//! matchmaking through the session store, deals when a table fills, and
//! spawns (or respawns from the store) at most one actor per game id.
//!
//! ## Example
//!
//! ```no_run
//! use meksikaner::session::MemorySessionStore;
//! use meksikaner::table::{GameManager, SessionConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), meksikaner::session::GameError> {
//!     let manager = GameManager::new(Arc::new(MemorySessionStore::new()), SessionConfig::default());
//!
//!     let mut game_id = 0;
//!     for user_id in [1, 2, 3] {
//!         game_id = manager.join_or_create(user_id).await?.game_id;
//!     }
//!
//!     let view = manager.place_bid(game_id, 1, "6".parse().unwrap()).await?;
//!     assert_eq!(view.turn_user_id, Some(2));
//!     Ok(())
//! }
//! ```

pub mod actor;
pub mod config;
pub mod manager;
pub mod messages;

pub use actor::{GameActor, GameHandle};
pub use config::SessionConfig;
pub use manager::GameManager;
pub use messages::{BiddingView, GameEvent, GameMessage, SubscriptionId};
