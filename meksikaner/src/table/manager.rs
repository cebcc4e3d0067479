//! Game manager: matchmaking entry point and owner of the game actors.

use super::{
    actor::{GameActor, GameHandle, Subscriber},
    config::SessionConfig,
    messages::{BiddingView, GameEvent, GameMessage, SubscriptionId},
};
use crate::{
    game::{BidError, BidOption, Card, generate_deck},
    session::{GameError, GameId, GameResult, GameStatus, JoinOutcome, SessionStore, UserId},
};
use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};
use tokio::sync::{RwLock, mpsc, oneshot};

type Subscribers = HashMap<SubscriptionId, Subscriber>;

/// Manages every active game's actor
///
/// At most one actor runs per game id. Actors are spawned when bidding
/// opens and respawned from the store's persisted round when needed, so a
/// restarted server picks up in-flight auctions.
#[derive(Clone)]
pub struct GameManager {
    store: Arc<dyn SessionStore>,
    config: SessionConfig,

    /// Active game handles
    games: Arc<RwLock<HashMap<GameId, GameHandle>>>,

    /// Subscribers to games whose bidding has not opened yet
    waiting: Arc<RwLock<HashMap<GameId, Subscribers>>>,

    next_subscription: Arc<AtomicU64>,
}

impl GameManager {
    /// Create a new game manager
    ///
    /// # Arguments
    ///
    /// * `store` - Session store
    /// * `config` - Session configuration
    ///
    /// # Returns
    ///
    /// * `GameManager` - New manager with no running actors
    pub fn new(store: Arc<dyn SessionStore>, config: SessionConfig) -> Self {
        Self {
            store,
            config,
            games: Arc::new(RwLock::new(HashMap::new())),
            waiting: Arc::new(RwLock::new(HashMap::new())),
            next_subscription: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Spawn actors for every game still in bidding
    ///
    /// # Returns
    ///
    /// * `GameResult<usize>` - Number of actors spawned
    pub async fn load_active_games(&self) -> GameResult<usize> {
        let game_ids = self.store.list_active_games().await?;
        let mut loaded = 0;

        for game_id in game_ids {
            match self.game_handle(game_id).await {
                Ok(_) => loaded += 1,
                Err(e) => log::warn!("Failed to resume game {}: {}", game_id, e),
            }
        }

        if loaded > 0 {
            log::info!("Resumed {} games in bidding", loaded);
        }
        Ok(loaded)
    }

    /// Seat a player, dealing immediately when the table fills
    ///
    /// # Arguments
    ///
    /// * `user_id` - Joining user
    ///
    /// # Returns
    ///
    /// * `GameResult<JoinOutcome>` - Game and seat assigned
    pub async fn join_or_create(&self, user_id: UserId) -> GameResult<JoinOutcome> {
        let outcome = self.store.join_or_create(user_id).await?;
        log::info!(
            "User {} took seat {} in game {} ({} seated{})",
            user_id,
            outcome.seat_index,
            outcome.game_id,
            outcome.seat_count,
            if outcome.created { ", new game" } else { "" }
        );

        self.notify_waiting(
            outcome.game_id,
            GameEvent::PlayerJoined {
                game_id: outcome.game_id,
                user_id,
                seat_count: outcome.seat_count,
            },
        )
        .await;

        if outcome.is_full() && self.config.auto_deal {
            match self.deal_cards(outcome.game_id).await {
                Ok(_) | Err(GameError::AlreadyDealt(_)) => {}
                // The join itself stands; the deal can be retried explicitly.
                Err(e) => log::error!("Game {}: automatic deal failed: {}", outcome.game_id, e),
            }
        }

        Ok(outcome)
    }

    /// Shuffle, deal and open bidding
    ///
    /// # Returns
    ///
    /// * `GameResult<Vec<Card>>` - The talon
    pub async fn deal_cards(&self, game_id: GameId) -> GameResult<Vec<Card>> {
        let deck = generate_deck(&mut rand::rng());
        let talon = self.store.deal_cards(game_id, &deck).await?;
        log::info!("Game {}: cards dealt, bidding open", game_id);

        // Actors are also spawned lazily, so a failure here is not fatal.
        if let Err(e) = self.game_handle(game_id).await {
            log::warn!("Game {}: could not start bidding actor: {}", game_id, e);
        }

        Ok(talon)
    }

    /// Get the live actor for a game in bidding, spawning it if needed
    ///
    /// The round and seats are read before the map is locked, so a slow
    /// store read for one game never holds up requests for another.
    pub async fn game_handle(&self, game_id: GameId) -> GameResult<GameHandle> {
        if let Some(handle) = self.live_handle(game_id).await {
            return Ok(handle);
        }

        let round = self
            .store
            .load_bid_round(game_id)
            .await?
            .ok_or_else(|| GameError::NotFound(format!("Game {game_id} has no bidding round")))?;
        if round.is_resolved() {
            let mut games = self.games.write().await;
            if games.get(&game_id).is_some_and(GameHandle::is_closed) {
                games.remove(&game_id);
            }
            return Err(BidError::Closed.into());
        }

        let players: Vec<UserId> = self
            .store
            .list_seats(game_id)
            .await?
            .into_iter()
            .map(|seat| seat.user_id)
            .collect();

        let handle = {
            let mut games = self.games.write().await;
            // Another caller may have spawned it while we were loading.
            if let Some(handle) = games.get(&game_id)
                && !handle.is_closed()
            {
                return Ok(handle.clone());
            }

            let (actor, handle) = GameActor::new(
                game_id,
                self.config.clone(),
                self.store.clone(),
                round,
                players,
            );
            games.insert(game_id, handle.clone());
            tokio::spawn(async move {
                actor.run().await;
            });
            handle
        };
        log::info!("Spawned bidding actor for game {}", game_id);

        // Hand over anyone who subscribed before bidding opened.
        let pending = self.waiting.write().await.remove(&game_id);
        for (subscription, subscriber) in pending.into_iter().flatten() {
            let _ = handle
                .send(GameMessage::Subscribe {
                    subscription,
                    user_id: subscriber.user_id,
                    sender: subscriber.sender,
                })
                .await;
        }

        Ok(handle)
    }

    async fn live_handle(&self, game_id: GameId) -> Option<GameHandle> {
        self.games
            .read()
            .await
            .get(&game_id)
            .filter(|handle| !handle.is_closed())
            .cloned()
    }

    /// Route a bid to the game's actor
    ///
    /// # Arguments
    ///
    /// * `game_id` - Game ID
    /// * `user_id` - Bidding user
    /// * `option` - Bid or pass
    ///
    /// # Returns
    ///
    /// * `GameResult<BiddingView>` - Round after the bid
    pub async fn place_bid(
        &self,
        game_id: GameId,
        user_id: UserId,
        option: BidOption,
    ) -> GameResult<BiddingView> {
        let handle = self.game_handle(game_id).await?;

        let (tx, rx) = oneshot::channel();
        handle
            .send(GameMessage::PlaceBid {
                user_id,
                option,
                response: tx,
            })
            .await
            .map_err(|_| GameError::Bidding(BidError::Closed))?;

        rx.await.map_err(|_| GameError::Bidding(BidError::Closed))?
    }

    /// Current bidding round of a game
    ///
    /// Asks the live actor when there is one, otherwise reads the persisted
    /// round (which is how finished auctions stay visible).
    pub async fn bidding_view(&self, game_id: GameId) -> GameResult<BiddingView> {
        if let Some(handle) = self.live_handle(game_id).await {
            let (tx, rx) = oneshot::channel();
            if handle.send(GameMessage::GetRound { response: tx }).await.is_ok()
                && let Ok(view) = rx.await
            {
                return Ok(view);
            }
        }

        let round = self
            .store
            .load_bid_round(game_id)
            .await?
            .ok_or_else(|| GameError::NotFound(format!("Game {game_id} has no bidding round")))?;
        let players: Vec<UserId> = self
            .store
            .list_seats(game_id)
            .await?
            .into_iter()
            .map(|seat| seat.user_id)
            .collect();

        Ok(BiddingView::new(game_id, &round, &players))
    }

    /// Subscribe a seated player to a game's events
    ///
    /// Players may subscribe as soon as they hold a seat; events start with
    /// seat updates and switch to bidding snapshots once cards are dealt.
    /// Each call opens a separate subscription, so one user can follow the
    /// game from several connections.
    ///
    /// # Returns
    ///
    /// * `GameResult<SubscriptionId>` - Id to pass to [`GameManager::unsubscribe`]
    pub async fn subscribe(
        &self,
        game_id: GameId,
        user_id: UserId,
        sender: mpsc::Sender<GameEvent>,
    ) -> GameResult<SubscriptionId> {
        let game = self.store.get_game(game_id).await?;
        let seated = self
            .store
            .list_seats(game_id)
            .await?
            .iter()
            .any(|seat| seat.user_id == user_id);
        if !seated {
            return Err(BidError::NotSeated(user_id).into());
        }

        let subscription = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        let subscriber = Subscriber { user_id, sender };

        match game.status {
            GameStatus::Bidding => self.subscribe_live(game_id, subscription, subscriber).await?,
            GameStatus::Waiting | GameStatus::Dealing => {
                self.waiting
                    .write()
                    .await
                    .entry(game_id)
                    .or_default()
                    .insert(subscription, subscriber);
                log::debug!("User {} waiting on game {}", user_id, game_id);

                // Bidding may have opened since the status was read, after
                // the waiting room was already handed over.
                if self.store.get_game(game_id).await?.status == GameStatus::Bidding
                    && let Some(subscriber) = self.take_waiting(game_id, subscription).await
                {
                    self.subscribe_live(game_id, subscription, subscriber).await?;
                }
            }
            GameStatus::InProgress | GameStatus::Finished => return Err(BidError::Closed.into()),
        }

        Ok(subscription)
    }

    async fn subscribe_live(
        &self,
        game_id: GameId,
        subscription: SubscriptionId,
        subscriber: Subscriber,
    ) -> GameResult<()> {
        let handle = self.game_handle(game_id).await?;
        handle
            .send(GameMessage::Subscribe {
                subscription,
                user_id: subscriber.user_id,
                sender: subscriber.sender,
            })
            .await
            .map_err(|_| GameError::Bidding(BidError::Closed))
    }

    async fn take_waiting(
        &self,
        game_id: GameId,
        subscription: SubscriptionId,
    ) -> Option<Subscriber> {
        let mut waiting = self.waiting.write().await;
        let subscribers = waiting.get_mut(&game_id)?;
        let subscriber = subscribers.remove(&subscription);
        if subscribers.is_empty() {
            waiting.remove(&game_id);
        }
        subscriber
    }

    /// Drop one subscription, wherever it is held
    pub async fn unsubscribe(&self, game_id: GameId, subscription: SubscriptionId) {
        if self.take_waiting(game_id, subscription).await.is_some() {
            return;
        }

        let live = self.games.read().await.get(&game_id).cloned();
        if let Some(handle) = live {
            let _ = handle.send(GameMessage::Unsubscribe { subscription }).await;
        }
    }

    async fn notify_waiting(&self, game_id: GameId, event: GameEvent) {
        let mut waiting = self.waiting.write().await;
        if let Some(subscribers) = waiting.get_mut(&game_id) {
            subscribers.retain(|_, subscriber| {
                match subscriber.sender.try_send(event.clone()) {
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        log::debug!("Subscriber {} disconnected, removing", subscriber.user_id);
                        false
                    }
                    _ => true,
                }
            });
        }
    }

    /// Stop a game's actor
    pub async fn close_game(&self, game_id: GameId) -> GameResult<()> {
        let handle = self.games.write().await.remove(&game_id);

        if let Some(handle) = handle {
            let (tx, rx) = oneshot::channel();
            if handle.send(GameMessage::Close { response: tx }).await.is_ok() {
                let _ = rx.await;
            }
            log::info!("Closed game {}", game_id);
        }

        Ok(())
    }

    /// Stop every actor
    pub async fn shutdown(&self) {
        let game_ids: Vec<GameId> = self.games.read().await.keys().copied().collect();
        for game_id in game_ids {
            let _ = self.close_game(game_id).await;
        }
    }

    /// Number of running actors; stopped ones are pruned
    pub async fn active_game_count(&self) -> usize {
        let mut games = self.games.write().await;
        games.retain(|_, handle| !handle.is_closed());
        games.len()
    }
}
