//! Session store trait and its PostgreSQL implementation.

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow, types::Json};

use super::{
    errors::{GameError, GameResult},
    models::{Game, GameId, GameStatus, JoinOutcome, Seat, UserId},
};
use crate::{
    db::timeouts::{with_default_timeout, with_transaction_timeout},
    game::{BidOutcome, BidRound, Card, constants::PLAYERS_PER_GAME, deal},
};

/// Durable record of games, seats, hands and bidding rounds.
///
/// Every mutation is atomic: either all of its writes land or none do.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Seat `user_id` at the oldest open game, or open a new one.
    ///
    /// The seat reservation is a single conditional update, so concurrent
    /// joins can never push a game past three seats. Filling the third seat
    /// moves the game to [`GameStatus::Dealing`].
    async fn join_or_create(&self, user_id: UserId) -> GameResult<JoinOutcome>;

    async fn get_game(&self, game_id: GameId) -> GameResult<Game>;

    /// Seats ordered by seat index.
    async fn list_seats(&self, game_id: GameId) -> GameResult<Vec<Seat>>;

    async fn get_hand(&self, game_id: GameId, user_id: UserId) -> GameResult<Vec<Card>>;

    /// Deal `deck` to the game's three seats and open bidding.
    ///
    /// Hands, talon, the `bidding` status and a fresh [`BidRound`] are
    /// written together. Returns the talon.
    ///
    /// # Errors
    ///
    /// * `GameError::InsufficientPlayers` - fewer than three seats; nothing written
    /// * `GameError::AlreadyDealt` - game is not waiting for a deal
    async fn deal_cards(&self, game_id: GameId, deck: &[Card]) -> GameResult<Vec<Card>>;

    async fn load_bid_round(&self, game_id: GameId) -> GameResult<Option<BidRound>>;

    /// Persist `round`. A resolved round also moves the game on: a win to
    /// `in_progress`, a void back to `dealing` with hands and talon cleared.
    async fn save_bid_round(&self, game_id: GameId, round: &BidRound) -> GameResult<()>;

    /// Games whose bidding is still running.
    async fn list_active_games(&self) -> GameResult<Vec<GameId>>;

    async fn health_check(&self) -> GameResult<()>;
}

pub(crate) fn validate_user_id(user_id: UserId) -> GameResult<()> {
    if user_id <= 0 {
        return Err(GameError::InvalidArgument(format!(
            "userId must be a positive integer, got {user_id}"
        )));
    }
    Ok(())
}

pub(crate) fn validate_game_id(game_id: GameId) -> GameResult<()> {
    if game_id <= 0 {
        return Err(GameError::InvalidArgument(format!(
            "gameId must be a positive integer, got {game_id}"
        )));
    }
    Ok(())
}

pub(crate) fn game_not_found(game_id: GameId) -> GameError {
    GameError::NotFound(format!("Game {game_id} not found"))
}

pub(crate) fn seat_not_found(game_id: GameId, user_id: UserId) -> GameError {
    GameError::NotFound(format!("User {user_id} has no seat in game {game_id}"))
}

/// PostgreSQL-backed session store
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn game_from_row(row: &PgRow) -> GameResult<Game> {
    let status: String = row.try_get("status")?;
    let seat_count: i32 = row.try_get("seat_count")?;
    let talon: Json<Vec<Card>> = row.try_get("talon_cards")?;

    Ok(Game {
        id: row.try_get("id")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        status: status.parse()?,
        seat_count: seat_count as usize,
        talon: talon.0,
    })
}

fn seat_from_row(row: &PgRow) -> GameResult<Seat> {
    let status: String = row.try_get("status")?;
    let seat_index: i32 = row.try_get("seat_index")?;
    let hand: Json<Vec<Card>> = row.try_get("hand")?;

    Ok(Seat {
        id: row.try_get("id")?,
        game_id: row.try_get("game_id")?,
        user_id: row.try_get("user_id")?,
        seat_index: seat_index as usize,
        status: status.parse()?,
        hand: hand.0,
    })
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn join_or_create(&self, user_id: UserId) -> GameResult<JoinOutcome> {
        validate_user_id(user_id)?;

        with_transaction_timeout(async {
            let mut tx = self.pool.begin().await?;

            // Reserve a seat in the oldest open game this user is not already in.
            // Rows locked by a concurrent join are skipped rather than waited on.
            let reserved = sqlx::query(
                r#"
                UPDATE games
                SET seat_count = seat_count + 1,
                    status = CASE WHEN seat_count + 1 = $2 THEN 'dealing' ELSE status END
                WHERE id = (
                    SELECT g.id FROM games g
                    WHERE g.status = 'waiting'
                      AND g.seat_count < $2
                      AND NOT EXISTS (
                          SELECT 1 FROM game_seats s
                          WHERE s.game_id = g.id AND s.user_id = $1
                      )
                    ORDER BY g.created_at, g.id
                    LIMIT 1
                    FOR UPDATE SKIP LOCKED
                )
                AND seat_count < $2
                RETURNING id, seat_count
                "#,
            )
            .bind(user_id)
            .bind(PLAYERS_PER_GAME as i32)
            .fetch_optional(&mut *tx)
            .await?;

            let outcome = match reserved {
                Some(row) => {
                    let game_id: GameId = row.try_get("id")?;
                    let seat_count: i32 = row.try_get("seat_count")?;
                    let seat_index = seat_count - 1;

                    sqlx::query(
                        "INSERT INTO game_seats (game_id, user_id, seat_index) VALUES ($1, $2, $3)",
                    )
                    .bind(game_id)
                    .bind(user_id)
                    .bind(seat_index)
                    .execute(&mut *tx)
                    .await?;

                    JoinOutcome {
                        game_id,
                        seat_index: seat_index as usize,
                        seat_count: seat_count as usize,
                        created: false,
                    }
                }
                None => {
                    let row = sqlx::query(
                        r#"
                        INSERT INTO games (created_by, status, seat_count)
                        VALUES ($1, 'waiting', 1)
                        RETURNING id
                        "#,
                    )
                    .bind(user_id)
                    .fetch_one(&mut *tx)
                    .await?;
                    let game_id: GameId = row.try_get("id")?;

                    sqlx::query(
                        "INSERT INTO game_seats (game_id, user_id, seat_index) VALUES ($1, $2, 0)",
                    )
                    .bind(game_id)
                    .bind(user_id)
                    .execute(&mut *tx)
                    .await?;

                    JoinOutcome {
                        game_id,
                        seat_index: 0,
                        seat_count: 1,
                        created: true,
                    }
                }
            };

            tx.commit().await?;
            Ok::<_, GameError>(outcome)
        })
        .await
    }

    async fn get_game(&self, game_id: GameId) -> GameResult<Game> {
        validate_game_id(game_id)?;

        with_default_timeout(async {
            let row = sqlx::query(
                r#"
                SELECT id, created_by, status, seat_count, talon_cards, created_at
                FROM games
                WHERE id = $1
                "#,
            )
            .bind(game_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| game_not_found(game_id))?;

            game_from_row(&row)
        })
        .await
    }

    async fn list_seats(&self, game_id: GameId) -> GameResult<Vec<Seat>> {
        self.get_game(game_id).await?;

        with_default_timeout(async {
            let rows = sqlx::query(
                r#"
                SELECT id, game_id, user_id, seat_index, status, hand
                FROM game_seats
                WHERE game_id = $1
                ORDER BY seat_index ASC
                "#,
            )
            .bind(game_id)
            .fetch_all(&self.pool)
            .await?;

            rows.iter().map(seat_from_row).collect::<GameResult<Vec<_>>>()
        })
        .await
    }

    async fn get_hand(&self, game_id: GameId, user_id: UserId) -> GameResult<Vec<Card>> {
        validate_game_id(game_id)?;
        validate_user_id(user_id)?;

        with_default_timeout(async {
            let row = sqlx::query("SELECT hand FROM game_seats WHERE game_id = $1 AND user_id = $2")
                .bind(game_id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| seat_not_found(game_id, user_id))?;

            let hand: Json<Vec<Card>> = row.try_get("hand")?;
            Ok::<_, GameError>(hand.0)
        })
        .await
    }

    async fn deal_cards(&self, game_id: GameId, deck: &[Card]) -> GameResult<Vec<Card>> {
        validate_game_id(game_id)?;

        with_transaction_timeout(async {
            let mut tx = self.pool.begin().await?;

            let row = sqlx::query("SELECT status, seat_count FROM games WHERE id = $1 FOR UPDATE")
                .bind(game_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| game_not_found(game_id))?;

            let status: GameStatus = row.try_get::<String, _>("status")?.parse()?;
            let seated = row.try_get::<i32, _>("seat_count")? as usize;

            if seated < PLAYERS_PER_GAME {
                return Err(GameError::InsufficientPlayers { seated });
            }
            if status != GameStatus::Dealing {
                return Err(GameError::AlreadyDealt(game_id));
            }

            let dealt = deal(deck, seated)?;

            for (seat_index, hand) in dealt.hands.iter().enumerate() {
                let result = sqlx::query(
                    "UPDATE game_seats SET hand = $1 WHERE game_id = $2 AND seat_index = $3",
                )
                .bind(Json(hand))
                .bind(game_id)
                .bind(seat_index as i32)
                .execute(&mut *tx)
                .await?;

                if result.rows_affected() != 1 {
                    return Err(GameError::Storage(format!(
                        "Game {game_id} has no seat {seat_index}"
                    )));
                }
            }

            sqlx::query("UPDATE games SET talon_cards = $1, status = 'bidding' WHERE id = $2")
                .bind(Json(&dealt.talon))
                .bind(game_id)
                .execute(&mut *tx)
                .await?;

            sqlx::query(
                r#"
                INSERT INTO bid_rounds (game_id, state, updated_at)
                VALUES ($1, $2, NOW())
                ON CONFLICT (game_id)
                DO UPDATE SET state = EXCLUDED.state, updated_at = NOW()
                "#,
            )
            .bind(game_id)
            .bind(Json(BidRound::new()))
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
            Ok::<_, GameError>(dealt.talon)
        })
        .await
    }

    async fn load_bid_round(&self, game_id: GameId) -> GameResult<Option<BidRound>> {
        validate_game_id(game_id)?;

        with_default_timeout(async {
            let row = sqlx::query("SELECT state FROM bid_rounds WHERE game_id = $1")
                .bind(game_id)
                .fetch_optional(&self.pool)
                .await?;

            match row {
                Some(row) => {
                    let state: Json<BidRound> = row.try_get("state")?;
                    Ok::<_, GameError>(Some(state.0))
                }
                None => Ok(None),
            }
        })
        .await
    }

    async fn save_bid_round(&self, game_id: GameId, round: &BidRound) -> GameResult<()> {
        validate_game_id(game_id)?;

        with_transaction_timeout(async {
            let mut tx = self.pool.begin().await?;

            let result = sqlx::query(
                "UPDATE bid_rounds SET state = $2, updated_at = NOW() WHERE game_id = $1",
            )
            .bind(game_id)
            .bind(Json(round))
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(GameError::NotFound(format!(
                    "Game {game_id} has no bidding round"
                )));
            }

            match round.outcome() {
                Some(BidOutcome::Won { .. }) => {
                    sqlx::query("UPDATE games SET status = 'in_progress' WHERE id = $1")
                        .bind(game_id)
                        .execute(&mut *tx)
                        .await?;
                }
                Some(BidOutcome::Void) => {
                    sqlx::query("UPDATE game_seats SET hand = '[]'::jsonb WHERE game_id = $1")
                        .bind(game_id)
                        .execute(&mut *tx)
                        .await?;
                    sqlx::query(
                        "UPDATE games SET status = 'dealing', talon_cards = '[]'::jsonb WHERE id = $1",
                    )
                    .bind(game_id)
                    .execute(&mut *tx)
                    .await?;
                }
                None => {}
            }

            tx.commit().await?;
            Ok::<_, GameError>(())
        })
        .await
    }

    async fn list_active_games(&self) -> GameResult<Vec<GameId>> {
        with_default_timeout(async {
            let rows = sqlx::query("SELECT id FROM games WHERE status = 'bidding' ORDER BY id ASC")
                .fetch_all(&self.pool)
                .await?;

            rows.iter()
                .map(|row| row.try_get::<GameId, _>("id").map_err(GameError::from))
                .collect::<GameResult<Vec<_>>>()
        })
        .await
    }

    async fn health_check(&self) -> GameResult<()> {
        with_default_timeout(async {
            sqlx::query("SELECT 1").execute(&self.pool).await?;
            Ok::<_, GameError>(())
        })
        .await
    }
}
