//! Game actor owning one bidding round.

use super::{
    config::SessionConfig,
    messages::{BiddingView, GameEvent, GameMessage, SubscriptionId},
};
use crate::{
    game::{BidError, BidOption, BidOutcome, BidRound, generate_deck},
    session::{GameId, GameResult, SessionStore, UserId},
};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::mpsc;

/// Game actor handle for sending messages
#[derive(Clone, Debug)]
pub struct GameHandle {
    sender: mpsc::Sender<GameMessage>,
    game_id: GameId,
}

impl GameHandle {
    pub fn new(sender: mpsc::Sender<GameMessage>, game_id: GameId) -> Self {
        Self { sender, game_id }
    }

    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    /// Whether the actor has stopped
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Send a message to the game
    pub async fn send(&self, message: GameMessage) -> Result<(), String> {
        self.sender
            .send(message)
            .await
            .map_err(|_| format!("Game {} is closed", self.game_id))
    }
}

/// One connection's event channel
#[derive(Debug)]
pub struct Subscriber {
    pub user_id: UserId,
    pub sender: mpsc::Sender<GameEvent>,
}

/// Actor serializing every action on one game's bidding round.
///
/// The round is persisted before the in-memory copy changes, so a failed
/// write leaves the actor exactly where it was.
pub struct GameActor {
    id: GameId,
    config: SessionConfig,
    store: Arc<dyn SessionStore>,
    round: BidRound,
    /// User ids indexed by seat
    players: Vec<UserId>,
    inbox: mpsc::Receiver<GameMessage>,
    subscribers: HashMap<SubscriptionId, Subscriber>,
    is_closed: bool,
}

impl GameActor {
    /// Create a new game actor
    ///
    /// # Arguments
    ///
    /// * `id` - Game ID
    /// * `config` - Session configuration
    /// * `store` - Session store the round is persisted to
    /// * `round` - Round to resume (a fresh one right after a deal)
    /// * `players` - User ids in seat order
    ///
    /// # Returns
    ///
    /// * `(GameActor, GameHandle)` - Actor and handle for sending messages
    pub fn new(
        id: GameId,
        config: SessionConfig,
        store: Arc<dyn SessionStore>,
        round: BidRound,
        players: Vec<UserId>,
    ) -> (Self, GameHandle) {
        let (sender, inbox) = mpsc::channel(config.channel_capacity.max(1));

        let actor = Self {
            id,
            config,
            store,
            round,
            players,
            inbox,
            subscribers: HashMap::new(),
            is_closed: false,
        };

        (actor, GameHandle::new(sender, id))
    }

    /// Run the actor until it is closed or bidding is won
    pub async fn run(mut self) {
        log::info!("Game {} bidding actor starting", self.id);

        while let Some(message) = self.inbox.recv().await {
            self.handle_message(message).await;

            if self.is_closed {
                break;
            }
        }

        log::info!("Game {} bidding actor stopped", self.id);
    }

    async fn handle_message(&mut self, message: GameMessage) {
        match message {
            GameMessage::PlaceBid {
                user_id,
                option,
                response,
            } => {
                let result = self.handle_bid(user_id, option).await;
                if let Err(e) = &result {
                    log::debug!("Game {}: bid from user {} rejected: {}", self.id, user_id, e);
                }
                let _ = response.send(result);
            }

            GameMessage::GetRound { response } => {
                let _ = response.send(self.view());
            }

            GameMessage::Subscribe {
                subscription,
                user_id,
                sender,
            } => {
                if sender.try_send(GameEvent::Bidding(self.view())).is_ok() {
                    self.subscribers
                        .insert(subscription, Subscriber { user_id, sender });
                    log::debug!(
                        "User {} subscribed to game {} (subscription {})",
                        user_id,
                        self.id,
                        subscription
                    );
                }
            }

            GameMessage::Unsubscribe { subscription } => {
                if let Some(subscriber) = self.subscribers.remove(&subscription) {
                    log::debug!(
                        "User {} unsubscribed from game {} (subscription {})",
                        subscriber.user_id,
                        self.id,
                        subscription
                    );
                }
            }

            GameMessage::Close { response } => {
                self.is_closed = true;
                let _ = response.send(());
            }
        }
    }

    fn view(&self) -> BiddingView {
        BiddingView::new(self.id, &self.round, &self.players)
    }

    async fn handle_bid(&mut self, user_id: UserId, option: BidOption) -> GameResult<BiddingView> {
        let seat = self
            .players
            .iter()
            .position(|&player| player == user_id)
            .ok_or(BidError::NotSeated(user_id))?;

        let mut next = self.round.clone();
        let outcome = next.apply(seat, option)?;

        if let Err(e) = self.store.save_bid_round(self.id, &next).await {
            log::error!("Game {}: failed to persist bid round: {}", self.id, e);
            return Err(e);
        }
        self.round = next;

        log::info!(
            "Game {}: seat {} (user {}) bid {}",
            self.id,
            seat,
            user_id,
            option
        );

        let view = self.view();
        match outcome {
            None => self.broadcast(GameEvent::Bidding(view.clone())),
            Some(outcome) => self.resolve(outcome).await,
        }

        Ok(view)
    }

    async fn resolve(&mut self, outcome: BidOutcome) {
        log::info!("Game {}: bidding resolved: {:?}", self.id, outcome);
        self.broadcast(GameEvent::resolved(self.id, outcome, &self.players));

        match outcome {
            BidOutcome::Won { .. } => self.is_closed = true,
            BidOutcome::Void if self.config.auto_deal => self.redeal().await,
            BidOutcome::Void => self.is_closed = true,
        }
    }

    /// Deal fresh cards after a void round and reopen bidding.
    async fn redeal(&mut self) {
        let deck = generate_deck(&mut rand::rng());

        match self.store.deal_cards(self.id, &deck).await {
            Ok(_) => {
                self.round = BidRound::new();
                log::info!("Game {}: cards re-dealt after void round", self.id);
                self.broadcast(GameEvent::Redealt { game_id: self.id });
                self.broadcast(GameEvent::Bidding(self.view()));
            }
            Err(e) => {
                log::error!("Game {}: re-deal failed: {}", self.id, e);
                self.is_closed = true;
            }
        }
    }

    /// Broadcast an event to all subscribers
    fn broadcast(&mut self, event: GameEvent) {
        self.subscribers.retain(|_, subscriber| {
            match subscriber.sender.try_send(event.clone()) {
                Ok(_) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    log::warn!(
                        "Subscriber {} channel full, dropping event",
                        subscriber.user_id
                    );
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    log::debug!("Subscriber {} disconnected, removing", subscriber.user_id);
                    false
                }
            }
        });
    }
}
