//! Splitting a shuffled deck into hands and the talon.

use serde::Serialize;
use thiserror::Error;

use super::{
    constants::{DECK_SIZE, HAND_SIZE, PLAYERS_PER_GAME, TALON_SIZE},
    entities::Card,
};

/// Dealing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DealError {
    /// Fewer than three seats are filled
    #[error("Not enough players to deal: {seated} of {required} seated", required = PLAYERS_PER_GAME)]
    InsufficientPlayers { seated: usize },

    /// Deck does not hold exactly 32 cards
    #[error("Deck must hold {expected} cards, got {0}", expected = DECK_SIZE)]
    InvalidDeck(usize),
}

/// Result of a deal: one hand per seat index plus the talon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deal {
    pub hands: [Vec<Card>; PLAYERS_PER_GAME],
    pub talon: Vec<Card>,
}

/// Partition `deck` for `seat_count` filled seats.
///
/// Seat `i` receives cards `[i*10, (i+1)*10)` and the talon is `[30, 32)`.
/// Nothing is dealt unless all three seats are filled.
pub fn deal(deck: &[Card], seat_count: usize) -> Result<Deal, DealError> {
    if seat_count < PLAYERS_PER_GAME {
        return Err(DealError::InsufficientPlayers { seated: seat_count });
    }
    if deck.len() != DECK_SIZE {
        return Err(DealError::InvalidDeck(deck.len()));
    }

    let hands = std::array::from_fn(|seat| deck[seat * HAND_SIZE..(seat + 1) * HAND_SIZE].to_vec());
    let talon_start = PLAYERS_PER_GAME * HAND_SIZE;
    let talon = deck[talon_start..talon_start + TALON_SIZE].to_vec();

    Ok(Deal { hands, talon })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::{generate_deck, ordered_deck};
    use rand::{SeedableRng, rngs::StdRng};
    use std::collections::HashSet;

    #[test]
    fn test_deal_slices_by_seat_index() {
        let deck = ordered_deck();
        let dealt = deal(&deck, 3).unwrap();

        assert_eq!(dealt.hands[0], deck[0..10].to_vec());
        assert_eq!(dealt.hands[1], deck[10..20].to_vec());
        assert_eq!(dealt.hands[2], deck[20..30].to_vec());
        assert_eq!(dealt.talon, deck[30..32].to_vec());
    }

    #[test]
    fn test_deal_is_a_partition() {
        let deck = generate_deck(&mut StdRng::seed_from_u64(2024));
        let dealt = deal(&deck, 3).unwrap();

        let mut seen = HashSet::new();
        for hand in &dealt.hands {
            assert_eq!(hand.len(), HAND_SIZE);
            for card in hand {
                assert!(seen.insert(*card), "card {card} dealt twice");
            }
        }
        assert_eq!(dealt.talon.len(), TALON_SIZE);
        for card in &dealt.talon {
            assert!(seen.insert(*card));
        }

        let original: HashSet<_> = deck.into_iter().collect();
        assert_eq!(seen, original);
    }

    #[test]
    fn test_deal_rejects_missing_players() {
        let deck = ordered_deck();
        for seated in 0..3 {
            assert_eq!(
                deal(&deck, seated),
                Err(DealError::InsufficientPlayers { seated })
            );
        }
    }

    #[test]
    fn test_deal_rejects_short_deck() {
        let deck = ordered_deck();
        assert_eq!(deal(&deck[..31], 3), Err(DealError::InvalidDeck(31)));
    }

    #[test]
    fn test_error_messages() {
        let err = DealError::InsufficientPlayers { seated: 2 };
        assert_eq!(err.to_string(), "Not enough players to deal: 2 of 3 seated");

        let err = DealError::InvalidDeck(31);
        assert_eq!(err.to_string(), "Deck must hold 32 cards, got 31");
    }
}
