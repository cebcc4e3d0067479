//! Game actor message types.

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

use crate::{
    game::{Bid, BidOption, BidOutcome, BidRound, SeatIndex, StandingBid},
    session::{GameId, GameResult, UserId},
};

/// Identifies one event subscription; a user may hold several
pub type SubscriptionId = u64;

/// Messages that can be sent to a GameActor
#[derive(Debug)]
pub enum GameMessage {
    /// A seated player's bid or pass
    PlaceBid {
        user_id: UserId,
        option: BidOption,
        response: oneshot::Sender<GameResult<BiddingView>>,
    },

    /// Current round snapshot
    GetRound {
        response: oneshot::Sender<BiddingView>,
    },

    /// Subscribe to game events
    Subscribe {
        subscription: SubscriptionId,
        user_id: UserId,
        sender: mpsc::Sender<GameEvent>,
    },

    /// Drop one subscription
    Unsubscribe { subscription: SubscriptionId },

    /// Stop the actor
    Close { response: oneshot::Sender<()> },
}

/// Snapshot of a bidding round as shown to players
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BiddingView {
    pub game_id: GameId,
    /// Rounds are keyed by their game
    pub round_id: GameId,
    /// User ids in seat order
    pub players: Vec<UserId>,
    pub turn: Option<SeatIndex>,
    pub turn_user_id: Option<UserId>,
    pub min_bid: Bid,
    pub passed: Vec<SeatIndex>,
    pub high_bid: Option<StandingBid>,
    /// Options open to the seat on turn
    pub options: Vec<BidOption>,
    pub outcome: Option<BidOutcome>,
}

impl BiddingView {
    pub fn new(game_id: GameId, round: &BidRound, players: &[UserId]) -> Self {
        let turn = round.turn();
        Self {
            game_id,
            round_id: game_id,
            players: players.to_vec(),
            turn,
            turn_user_id: turn.and_then(|seat| players.get(seat).copied()),
            min_bid: round.min_bid(),
            passed: round.passed().to_vec(),
            high_bid: round.high_bid(),
            options: round.options(),
            outcome: round.outcome(),
        }
    }
}

/// Events pushed to subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum GameEvent {
    /// A seat filled while the table is still waiting
    PlayerJoined {
        game_id: GameId,
        user_id: UserId,
        seat_count: usize,
    },

    /// Round state after every accepted action
    Bidding(BiddingView),

    /// Bidding ended
    Resolved {
        game_id: GameId,
        outcome: BidOutcome,
        winner_user_id: Option<UserId>,
    },

    /// Fresh cards after a void round
    Redealt { game_id: GameId },
}

impl GameEvent {
    pub fn resolved(game_id: GameId, outcome: BidOutcome, players: &[UserId]) -> Self {
        let winner_user_id = match outcome {
            BidOutcome::Won { seat, .. } => players.get(seat).copied(),
            BidOutcome::Void => None,
        };
        GameEvent::Resolved {
            game_id,
            outcome,
            winner_user_id,
        }
    }
}
