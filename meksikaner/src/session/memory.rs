//! In-memory session store.
//!
//! Same semantics as [`PgSessionStore`](super::PgSessionStore), with one
//! mutex standing in for the database's transactions. Backs the test suites
//! and the server's `--memory` mode.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;

use super::{
    errors::{GameError, GameResult},
    models::{Game, GameId, GameStatus, JoinOutcome, Seat, SeatStatus, UserId},
    store::{SessionStore, game_not_found, seat_not_found, validate_game_id, validate_user_id},
};
use crate::game::{BidOutcome, BidRound, Card, constants::PLAYERS_PER_GAME, deal};

#[derive(Default)]
struct Inner {
    last_game_id: GameId,
    last_seat_id: i64,
    /// Keyed by id, so iteration order is creation order
    games: BTreeMap<GameId, Game>,
    seats: HashMap<GameId, Vec<Seat>>,
    rounds: HashMap<GameId, BidRound>,
}

impl Inner {
    fn game_mut(&mut self, game_id: GameId) -> GameResult<&mut Game> {
        self.games
            .get_mut(&game_id)
            .ok_or_else(|| game_not_found(game_id))
    }

    fn is_seated(&self, game_id: GameId, user_id: UserId) -> bool {
        self.seats
            .get(&game_id)
            .is_some_and(|seats| seats.iter().any(|s| s.user_id == user_id))
    }

    fn add_seat(&mut self, game_id: GameId, user_id: UserId, seat_index: usize) {
        self.last_seat_id += 1;
        let seat = Seat {
            id: self.last_seat_id,
            game_id,
            user_id,
            seat_index,
            status: SeatStatus::Joined,
            hand: Vec::new(),
        };
        self.seats.entry(game_id).or_default().push(seat);
    }
}

/// Session store held entirely in process memory
#[derive(Default)]
pub struct MemorySessionStore {
    inner: Mutex<Inner>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn join_or_create(&self, user_id: UserId) -> GameResult<JoinOutcome> {
        validate_user_id(user_id)?;
        let mut inner = self.inner.lock().await;

        let open = inner
            .games
            .values()
            .find(|g| {
                g.status == GameStatus::Waiting
                    && g.seat_count < PLAYERS_PER_GAME
                    && !inner.is_seated(g.id, user_id)
            })
            .map(|g| g.id);

        if let Some(game_id) = open {
            let game = inner.game_mut(game_id)?;
            game.seat_count += 1;
            if game.seat_count == PLAYERS_PER_GAME {
                game.status = GameStatus::Dealing;
            }
            let seat_count = game.seat_count;
            let seat_index = seat_count - 1;
            inner.add_seat(game_id, user_id, seat_index);

            return Ok(JoinOutcome {
                game_id,
                seat_index,
                seat_count,
                created: false,
            });
        }

        inner.last_game_id += 1;
        let game_id = inner.last_game_id;
        inner.games.insert(
            game_id,
            Game {
                id: game_id,
                created_by: user_id,
                created_at: Utc::now(),
                status: GameStatus::Waiting,
                seat_count: 1,
                talon: Vec::new(),
            },
        );
        inner.add_seat(game_id, user_id, 0);

        Ok(JoinOutcome {
            game_id,
            seat_index: 0,
            seat_count: 1,
            created: true,
        })
    }

    async fn get_game(&self, game_id: GameId) -> GameResult<Game> {
        validate_game_id(game_id)?;
        let inner = self.inner.lock().await;
        inner
            .games
            .get(&game_id)
            .cloned()
            .ok_or_else(|| game_not_found(game_id))
    }

    async fn list_seats(&self, game_id: GameId) -> GameResult<Vec<Seat>> {
        validate_game_id(game_id)?;
        let inner = self.inner.lock().await;
        if !inner.games.contains_key(&game_id) {
            return Err(game_not_found(game_id));
        }

        let mut seats = inner.seats.get(&game_id).cloned().unwrap_or_default();
        seats.sort_by_key(|s| s.seat_index);
        Ok(seats)
    }

    async fn get_hand(&self, game_id: GameId, user_id: UserId) -> GameResult<Vec<Card>> {
        validate_game_id(game_id)?;
        validate_user_id(user_id)?;
        let inner = self.inner.lock().await;

        inner
            .seats
            .get(&game_id)
            .and_then(|seats| seats.iter().find(|s| s.user_id == user_id))
            .map(|seat| seat.hand.clone())
            .ok_or_else(|| seat_not_found(game_id, user_id))
    }

    async fn deal_cards(&self, game_id: GameId, deck: &[Card]) -> GameResult<Vec<Card>> {
        validate_game_id(game_id)?;
        let mut inner = self.inner.lock().await;

        let game = inner.game_mut(game_id)?;
        if game.seat_count < PLAYERS_PER_GAME {
            return Err(GameError::InsufficientPlayers {
                seated: game.seat_count,
            });
        }
        if game.status != GameStatus::Dealing {
            return Err(GameError::AlreadyDealt(game_id));
        }

        // Everything is validated before the first write.
        let dealt = deal(deck, game.seat_count)?;
        let seats = inner.seats.get(&game_id).map(Vec::len).unwrap_or(0);
        if seats != PLAYERS_PER_GAME {
            return Err(GameError::Storage(format!(
                "Game {game_id} has {seats} seat rows"
            )));
        }

        let game = inner.game_mut(game_id)?;
        game.talon = dealt.talon.clone();
        game.status = GameStatus::Bidding;

        if let Some(seats) = inner.seats.get_mut(&game_id) {
            for seat in seats.iter_mut() {
                if let Some(hand) = dealt.hands.get(seat.seat_index) {
                    seat.hand = hand.clone();
                }
            }
        }
        inner.rounds.insert(game_id, BidRound::new());

        Ok(dealt.talon)
    }

    async fn load_bid_round(&self, game_id: GameId) -> GameResult<Option<BidRound>> {
        validate_game_id(game_id)?;
        let inner = self.inner.lock().await;
        Ok(inner.rounds.get(&game_id).cloned())
    }

    async fn save_bid_round(&self, game_id: GameId, round: &BidRound) -> GameResult<()> {
        validate_game_id(game_id)?;
        let mut inner = self.inner.lock().await;

        if !inner.rounds.contains_key(&game_id) {
            return Err(GameError::NotFound(format!(
                "Game {game_id} has no bidding round"
            )));
        }
        inner.rounds.insert(game_id, round.clone());

        match round.outcome() {
            Some(BidOutcome::Won { .. }) => {
                inner.game_mut(game_id)?.status = GameStatus::InProgress;
            }
            Some(BidOutcome::Void) => {
                let game = inner.game_mut(game_id)?;
                game.status = GameStatus::Dealing;
                game.talon.clear();
                if let Some(seats) = inner.seats.get_mut(&game_id) {
                    for seat in seats.iter_mut() {
                        seat.hand.clear();
                    }
                }
            }
            None => {}
        }

        Ok(())
    }

    async fn list_active_games(&self) -> GameResult<Vec<GameId>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .games
            .values()
            .filter(|g| g.status == GameStatus::Bidding)
            .map(|g| g.id)
            .collect())
    }

    async fn health_check(&self) -> GameResult<()> {
        Ok(())
    }
}
