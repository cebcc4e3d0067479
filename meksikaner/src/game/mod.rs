//! Meksikaner game rules: cards, the deal, and the bidding auction.
//!
//! Everything here is synchronous and storage-free. The session layer
//! ([`crate::session`]) persists the results and the table actors
//! ([`crate::table`]) serialize access to them.

pub mod bidding;
pub mod constants;
pub mod dealer;
pub mod entities;

pub use bidding::{
    Bid, BidError, BidOption, BidOutcome, BidRound, ParseBidError, RoundState, SeatIndex,
    StandingBid,
};
pub use dealer::{Deal, DealError, deal};
pub use entities::{Card, Rank, Suit, generate_deck, ordered_deck, shuffle};
