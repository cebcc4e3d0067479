/// Property-based tests for the bidding auction and the dealer
///
/// Random action sequences (legal or not) are thrown at a round to check
/// that rejections never change state and accepted actions keep the
/// round's invariants.
use meksikaner::game::{
    Bid, BidError, BidOption, BidOutcome, BidRound, deal, generate_deck,
    constants::{DECK_SIZE, HAND_SIZE, TALON_SIZE},
};
use proptest::prelude::*;
use rand::{SeedableRng, rngs::StdRng};
use std::collections::HashSet;

// Any option a client could send, including out-of-range numbers
fn option_strategy() -> impl Strategy<Value = BidOption> {
    prop_oneof![
        (0u8..=12).prop_map(|n| BidOption::Bid(Bid::Points(n))),
        Just(BidOption::Bid(Bid::Meksiko)),
        Just(BidOption::Dalje),
    ]
}

fn action_strategy() -> impl Strategy<Value = (usize, BidOption)> {
    (0usize..3, option_strategy())
}

proptest! {
    #[test]
    fn test_rejected_actions_never_change_state(
        actions in prop::collection::vec(action_strategy(), 1..40)
    ) {
        let mut round = BidRound::new();

        for (seat, option) in actions {
            let before = round.clone();
            match round.apply(seat, option) {
                Ok(_) => {
                    prop_assert_eq!(before.turn(), Some(seat));
                    prop_assert!(before.options_for(seat).contains(&option));
                }
                Err(BidError::Closed) => {
                    prop_assert!(before.is_resolved());
                    prop_assert_eq!(&round, &before);
                }
                Err(BidError::OutOfTurn { expected, .. }) => {
                    prop_assert_eq!(before.turn(), Some(expected));
                    prop_assert_eq!(&round, &before);
                }
                Err(_) => prop_assert_eq!(&round, &before),
            }
        }
    }

    #[test]
    fn test_accepted_actions_keep_invariants(
        actions in prop::collection::vec(action_strategy(), 1..40)
    ) {
        let mut round = BidRound::new();

        for (seat, option) in actions {
            let before = round.clone();
            if round.apply(seat, option).is_err() {
                continue;
            }

            // The floor never drops.
            prop_assert!(round.min_bid() >= before.min_bid());
            prop_assert!(round.passed().len() <= 3);

            if let Some(turn) = round.turn() {
                prop_assert!(!round.passed().contains(&turn));
            }

            match round.outcome() {
                Some(BidOutcome::Void) => {
                    prop_assert_eq!(round.passed().len(), 3);
                    prop_assert!(round.high_bid().is_none());
                }
                Some(BidOutcome::Won { seat: winner, bid }) => {
                    prop_assert!(!round.passed().contains(&winner));
                    prop_assert_eq!(round.high_bid().map(|b| b.bid), Some(bid));
                    prop_assert!(!round.options_for(winner).contains(&BidOption::Dalje));
                }
                None => prop_assert!(round.passed().len() < 3),
            }
        }
    }

    #[test]
    fn test_offered_options_are_always_accepted(
        picks in prop::collection::vec(any::<prop::sample::Index>(), 1..30)
    ) {
        let mut round = BidRound::new();

        for pick in picks {
            let Some(turn) = round.turn() else { break };
            let options = round.options();
            prop_assert!(!options.is_empty());

            let option = options[pick.index(options.len())];
            prop_assert!(round.apply(turn, option).is_ok());
        }
    }

    #[test]
    fn test_any_seeded_deal_partitions_the_deck(seed in any::<u64>()) {
        let deck = generate_deck(&mut StdRng::seed_from_u64(seed));
        prop_assert_eq!(deck.len(), DECK_SIZE);

        let dealt = deal(&deck, 3).unwrap();
        let mut seen = HashSet::new();
        for hand in &dealt.hands {
            prop_assert_eq!(hand.len(), HAND_SIZE);
            for card in hand {
                prop_assert!(seen.insert(*card));
            }
        }
        prop_assert_eq!(dealt.talon.len(), TALON_SIZE);
        for card in &dealt.talon {
            prop_assert!(seen.insert(*card));
        }
        prop_assert_eq!(seen.len(), DECK_SIZE);
    }
}
