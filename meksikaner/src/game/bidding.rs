//! Turn-ordered auction that decides who plays the hand.
//!
//! A round starts with seat 0 on turn and a floor of [`OPENING_BID`]. Each
//! seat either names a bid at or above the floor (which then becomes the new
//! floor) or says "Dalje" and drops out. Once two seats have dropped out
//! behind a standing bid, the remaining seat wins at that bid. If all three
//! drop out without anyone bidding, the round is void and the cards must be
//! re-dealt.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

use super::constants::{MAX_NUMERIC_BID, OPENING_BID, PLAYERS_PER_GAME};

/// Seat index within a game (0, 1 or 2).
pub type SeatIndex = usize;

/// A bid value. `Meksiko` outranks every numeric bid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Bid {
    Points(u8),
    Meksiko,
}

/// What a seat may say on its turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BidOption {
    Bid(Bid),
    /// Pass
    Dalje,
}

impl fmt::Display for Bid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bid::Points(points) => write!(f, "{points}"),
            Bid::Meksiko => write!(f, "Meksiko"),
        }
    }
}

impl fmt::Display for BidOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BidOption::Bid(bid) => write!(f, "{bid}"),
            BidOption::Dalje => write!(f, "Dalje"),
        }
    }
}

/// Unparseable bid text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown bid option: {0:?}")]
pub struct ParseBidError(pub String);

impl FromStr for Bid {
    type Err = ParseBidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("meksiko") {
            return Ok(Bid::Meksiko);
        }
        trimmed
            .parse::<u8>()
            .map(Bid::Points)
            .map_err(|_| ParseBidError(s.to_string()))
    }
}

impl FromStr for BidOption {
    type Err = ParseBidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("dalje") {
            Ok(BidOption::Dalje)
        } else {
            s.parse().map(BidOption::Bid)
        }
    }
}

impl TryFrom<String> for Bid {
    type Error = ParseBidError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Bid> for String {
    fn from(bid: Bid) -> Self {
        bid.to_string()
    }
}

impl TryFrom<String> for BidOption {
    type Error = ParseBidError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BidOption> for String {
    fn from(option: BidOption) -> Self {
        option.to_string()
    }
}

/// Bidding protocol violations. None of them change the round.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BidError {
    /// Seat acted while another seat holds the turn
    #[error("Not your turn: seat {seat} acted, seat {expected} holds the turn")]
    OutOfTurn {
        seat: SeatIndex,
        expected: SeatIndex,
    },

    /// Option is not in the acting seat's option set
    #[error("Illegal option: {0}")]
    IllegalOption(BidOption),

    /// Round already has an outcome
    #[error("Bidding is already over")]
    Closed,

    /// User holds no seat at this game
    #[error("User {0} is not seated at this game")]
    NotSeated(i64),
}

/// Highest bid made so far and who made it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingBid {
    pub seat: SeatIndex,
    pub bid: Bid,
}

/// How a round ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BidOutcome {
    /// `seat` plays the hand at `bid`
    Won { seat: SeatIndex, bid: Bid },
    /// Everybody passed; re-deal
    Void,
}

/// Where the round currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundState {
    Awaiting { turn: SeatIndex },
    Resolved(BidOutcome),
}

/// State of one bidding round.
///
/// Serializable so the session store can persist it after every accepted
/// action and a restarted actor can pick up where it left off.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidRound {
    min_bid: Bid,
    passed: Vec<SeatIndex>,
    turn: SeatIndex,
    high_bid: Option<StandingBid>,
    outcome: Option<BidOutcome>,
}

impl Default for BidRound {
    fn default() -> Self {
        Self::new()
    }
}

impl BidRound {
    /// Fresh round: seat 0 on turn, floor at the opening bid.
    pub fn new() -> Self {
        Self {
            min_bid: Bid::Points(OPENING_BID),
            passed: Vec::new(),
            turn: 0,
            high_bid: None,
            outcome: None,
        }
    }

    pub fn state(&self) -> RoundState {
        match self.outcome {
            Some(outcome) => RoundState::Resolved(outcome),
            None => RoundState::Awaiting { turn: self.turn },
        }
    }

    /// Seat holding the turn, `None` once resolved.
    pub fn turn(&self) -> Option<SeatIndex> {
        match self.state() {
            RoundState::Awaiting { turn } => Some(turn),
            RoundState::Resolved(_) => None,
        }
    }

    pub fn min_bid(&self) -> Bid {
        self.min_bid
    }

    /// Seats that said "Dalje", in the order they did.
    pub fn passed(&self) -> &[SeatIndex] {
        &self.passed
    }

    pub fn high_bid(&self) -> Option<StandingBid> {
        self.high_bid
    }

    pub fn outcome(&self) -> Option<BidOutcome> {
        self.outcome
    }

    pub fn is_resolved(&self) -> bool {
        self.outcome.is_some()
    }

    /// Options offered to the seat on turn. Empty once the round is over.
    pub fn options(&self) -> Vec<BidOption> {
        match self.turn() {
            Some(turn) => self.options_for(turn),
            None => Vec::new(),
        }
    }

    /// Options the rules give `seat`, whether or not it holds the turn.
    ///
    /// A seat that already passed has none. "Dalje" is withheld once two
    /// seats have passed behind a standing bid: the last seat cannot walk
    /// away from a contract it holds.
    pub fn options_for(&self, seat: SeatIndex) -> Vec<BidOption> {
        if seat >= PLAYERS_PER_GAME || self.passed.contains(&seat) {
            return Vec::new();
        }

        let mut options: Vec<BidOption> = match self.min_bid {
            Bid::Points(floor) => (floor..=MAX_NUMERIC_BID)
                .map(|points| BidOption::Bid(Bid::Points(points)))
                .collect(),
            Bid::Meksiko => Vec::new(),
        };
        options.push(BidOption::Bid(Bid::Meksiko));

        let last_standing = self.passed.len() >= PLAYERS_PER_GAME - 1 && self.high_bid.is_some();
        if !last_standing {
            options.push(BidOption::Dalje);
        }
        options
    }

    /// Apply `option` from `seat`.
    ///
    /// Returns the outcome when this action ends the round. On error the
    /// round is left exactly as it was.
    pub fn apply(
        &mut self,
        seat: SeatIndex,
        option: BidOption,
    ) -> Result<Option<BidOutcome>, BidError> {
        let turn = self.turn().ok_or(BidError::Closed)?;
        if seat != turn {
            return Err(BidError::OutOfTurn {
                seat,
                expected: turn,
            });
        }
        if !self.options_for(seat).contains(&option) {
            return Err(BidError::IllegalOption(option));
        }

        match option {
            BidOption::Bid(bid) => {
                self.min_bid = bid;
                self.high_bid = Some(StandingBid { seat, bid });
                if self.passed.len() == PLAYERS_PER_GAME - 1 {
                    self.outcome = Some(BidOutcome::Won { seat, bid });
                } else {
                    self.turn = self.next_active(seat);
                }
            }
            BidOption::Dalje => {
                self.passed.push(seat);
                match (self.passed.len(), self.high_bid) {
                    (PLAYERS_PER_GAME, _) => self.outcome = Some(BidOutcome::Void),
                    (n, Some(standing)) if n == PLAYERS_PER_GAME - 1 => {
                        let winner = self.next_active(seat);
                        self.outcome = Some(BidOutcome::Won {
                            seat: winner,
                            bid: standing.bid,
                        });
                    }
                    _ => self.turn = self.next_active(seat),
                }
            }
        }

        Ok(self.outcome)
    }

    /// Next seat after `from` (clockwise) that has not passed.
    fn next_active(&self, from: SeatIndex) -> SeatIndex {
        (1..=PLAYERS_PER_GAME)
            .map(|step| (from + step) % PLAYERS_PER_GAME)
            .find(|seat| !self.passed.contains(seat))
            .unwrap_or(from)
    }
}
