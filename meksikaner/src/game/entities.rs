use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::constants::DECK_SIZE;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    #[serde(rename = "♠")]
    Spade,
    #[serde(rename = "♥")]
    Heart,
    #[serde(rename = "♦")]
    Diamond,
    #[serde(rename = "♣")]
    Club,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Spade, Suit::Heart, Suit::Diamond, Suit::Club];
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Spade => "♠",
            Self::Heart => "♥",
            Self::Diamond => "♦",
            Self::Club => "♣",
        };
        write!(f, "{repr}")
    }
}

/// Ranks of the 32-card deck, highest first.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Rank {
    #[serde(rename = "A")]
    Ace,
    #[serde(rename = "K")]
    King,
    #[serde(rename = "Q")]
    Queen,
    #[serde(rename = "J")]
    Jack,
    #[serde(rename = "10")]
    Ten,
    #[serde(rename = "9")]
    Nine,
    #[serde(rename = "8")]
    Eight,
    #[serde(rename = "7")]
    Seven,
}

impl Rank {
    pub const ALL: [Rank; 8] = [
        Rank::Ace,
        Rank::King,
        Rank::Queen,
        Rank::Jack,
        Rank::Ten,
        Rank::Nine,
        Rank::Eight,
        Rank::Seven,
    ];
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Ace => "A",
            Self::King => "K",
            Self::Queen => "Q",
            Self::Jack => "J",
            Self::Ten => "10",
            Self::Nine => "9",
            Self::Eight => "8",
            Self::Seven => "7",
        };
        write!(f, "{repr}")
    }
}

/// A card as stored in hands and the talon.
///
/// Serializes as `{"suit":"♠","value":"A"}`; the `value` key is what
/// existing clients read.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card {
    pub suit: Suit,
    #[serde(rename = "value")]
    pub rank: Rank,
}

impl Card {
    pub const fn new(suit: Suit, rank: Rank) -> Self {
        Self { suit, rank }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = format!("{}{}", self.rank, self.suit);
        write!(f, "{repr:>3}")
    }
}

/// The unshuffled deck: suits ♠♥♦♣, each from ace down to seven.
pub fn ordered_deck() -> Vec<Card> {
    let mut cards = Vec::with_capacity(DECK_SIZE);
    for suit in Suit::ALL {
        for rank in Rank::ALL {
            cards.push(Card::new(suit, rank));
        }
    }
    cards
}

/// In-place Fisher-Yates shuffle.
///
/// Walks the slice from the back, swapping each position with a uniformly
/// chosen index at or before it, so every permutation is equally likely
/// for a uniform `rng`.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

/// A freshly shuffled 32-card deck.
pub fn generate_deck<R: Rng + ?Sized>(rng: &mut R) -> Vec<Card> {
    let mut cards = ordered_deck();
    shuffle(&mut cards, rng);
    cards
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use std::collections::HashSet;

    #[test]
    fn test_ordered_deck_is_full_product() {
        let deck = ordered_deck();
        assert_eq!(deck.len(), DECK_SIZE);
        assert_eq!(deck[0], Card::new(Suit::Spade, Rank::Ace));
        assert_eq!(deck[7], Card::new(Suit::Spade, Rank::Seven));
        assert_eq!(deck[31], Card::new(Suit::Club, Rank::Seven));

        let unique: HashSet<_> = deck.iter().collect();
        assert_eq!(unique.len(), DECK_SIZE);
    }

    #[test]
    fn test_generated_deck_has_no_duplicates() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let deck = generate_deck(&mut rng);
            assert_eq!(deck.len(), DECK_SIZE);
            let unique: HashSet<_> = deck.iter().collect();
            assert_eq!(unique.len(), DECK_SIZE);
        }
    }

    #[test]
    fn test_same_seed_same_order() {
        let a = generate_deck(&mut StdRng::seed_from_u64(42));
        let b = generate_deck(&mut StdRng::seed_from_u64(42));
        let c = generate_deck(&mut StdRng::seed_from_u64(43));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_shuffle_moves_cards() {
        let deck = generate_deck(&mut StdRng::seed_from_u64(1));
        assert_ne!(deck, ordered_deck());
    }

    #[test]
    fn test_shuffle_handles_short_slices() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut empty: Vec<Card> = vec![];
        shuffle(&mut empty, &mut rng);
        assert!(empty.is_empty());

        let mut one = vec![Card::new(Suit::Heart, Rank::Nine)];
        shuffle(&mut one, &mut rng);
        assert_eq!(one, vec![Card::new(Suit::Heart, Rank::Nine)]);
    }

    #[test]
    fn test_shuffle_positions_roughly_uniform() {
        // Where the ace of spades lands over many shuffles of a 4-card slice.
        let mut rng = StdRng::seed_from_u64(99);
        let mut counts = [0usize; 4];
        for _ in 0..4000 {
            let mut cards = [0u8, 1, 2, 3];
            shuffle(&mut cards, &mut rng);
            let pos = cards.iter().position(|&c| c == 0).unwrap();
            counts[pos] += 1;
        }
        for count in counts {
            assert!((800..1200).contains(&count), "skewed counts: {counts:?}");
        }
    }

    #[test]
    fn test_card_json_shape() {
        let card = Card::new(Suit::Heart, Rank::Ten);
        let json = serde_json::to_string(&card).unwrap();
        assert_eq!(json, r#"{"suit":"♥","value":"10"}"#);

        let parsed: Card = serde_json::from_str(r#"{"suit":"♣","value":"Q"}"#).unwrap();
        assert_eq!(parsed, Card::new(Suit::Club, Rank::Queen));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Suit::Diamond), "♦");
        assert_eq!(format!("{}", Card::new(Suit::Spade, Rank::Ace)), " A♠");
        assert_eq!(format!("{}", Card::new(Suit::Club, Rank::Ten)), "10♣");
    }
}
