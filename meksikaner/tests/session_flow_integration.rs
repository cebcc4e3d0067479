//! End-to-end session flow against the in-memory store.
//!
//! Three players are matched, dealt and taken through a full auction using
//! the same manager the server drives.

use meksikaner::{
    game::{Bid, BidError, BidOption, BidOutcome, Card, constants::DECK_SIZE},
    session::{GameError, GameStatus, MemorySessionStore, SessionStore},
    table::{GameEvent, GameManager, SessionConfig},
};
use std::{collections::HashSet, sync::Arc, time::Duration};
use tokio::sync::mpsc;

fn manager_with(auto_deal: bool) -> (GameManager, Arc<dyn SessionStore>) {
    let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
    let config = SessionConfig {
        auto_deal,
        ..SessionConfig::default()
    };
    (GameManager::new(store.clone(), config), store)
}

fn bid(text: &str) -> BidOption {
    text.parse().expect("valid bid text")
}

#[tokio::test]
async fn test_three_players_deal_and_bid_to_a_winner() {
    let (manager, store) = manager_with(false);

    // Three joins land in one game, seats in join order
    let a = manager.join_or_create(100).await.unwrap();
    let b = manager.join_or_create(200).await.unwrap();
    let c = manager.join_or_create(300).await.unwrap();
    assert!(a.created);
    assert_eq!(a.game_id, b.game_id);
    assert_eq!(a.game_id, c.game_id);
    let game_id = a.game_id;

    let seats = store.list_seats(game_id).await.unwrap();
    assert_eq!(seats.len(), 3);
    assert_eq!(
        seats.iter().map(|s| (s.seat_index, s.user_id)).collect::<Vec<_>>(),
        vec![(0, 100), (1, 200), (2, 300)]
    );

    // One shuffle: 10/10/10 + 2, no card twice
    let talon = manager.deal_cards(game_id).await.unwrap();
    let mut all: Vec<Card> = talon.clone();
    for user_id in [100, 200, 300] {
        let hand = store.get_hand(game_id, user_id).await.unwrap();
        assert_eq!(hand.len(), 10);
        all.extend(hand);
    }
    assert_eq!(talon.len(), 2);
    assert_eq!(all.iter().collect::<HashSet<_>>().len(), DECK_SIZE);

    let game = store.get_game(game_id).await.unwrap();
    assert_eq!(game.status, GameStatus::Bidding);
    assert_eq!(game.talon, talon);

    // Bidding opens at 5 with seat 0 on turn
    let view = manager.bidding_view(game_id).await.unwrap();
    assert_eq!(view.min_bid, Bid::Points(5));
    assert_eq!(view.turn_user_id, Some(100));
    assert_eq!(
        view.options,
        ["5", "6", "7", "8", "9", "10", "Meksiko", "Dalje"].map(bid).to_vec()
    );

    manager.place_bid(game_id, 100, bid("6")).await.unwrap();
    manager.place_bid(game_id, 200, bid("Dalje")).await.unwrap();
    manager.place_bid(game_id, 300, bid("7")).await.unwrap();
    let view = manager.place_bid(game_id, 100, bid("Dalje")).await.unwrap();

    assert_eq!(
        view.outcome,
        Some(BidOutcome::Won {
            seat: 2,
            bid: Bid::Points(7)
        })
    );
    assert_eq!(
        store.get_game(game_id).await.unwrap().status,
        GameStatus::InProgress
    );
}

#[tokio::test]
async fn test_out_of_turn_bid_is_rejected() {
    let (manager, _store) = manager_with(true);
    let mut game_id = 0;
    for user_id in [1, 2, 3] {
        game_id = manager.join_or_create(user_id).await.unwrap().game_id;
    }

    let err = manager.place_bid(game_id, 2, bid("6")).await.unwrap_err();
    assert!(matches!(
        err,
        GameError::Bidding(BidError::OutOfTurn {
            seat: 1,
            expected: 0
        })
    ));

    let view = manager.bidding_view(game_id).await.unwrap();
    assert_eq!(view.turn, Some(0));
    assert!(view.high_bid.is_none());
}

#[tokio::test]
async fn test_deal_with_two_players_fails() {
    let (manager, store) = manager_with(true);
    let game_id = manager.join_or_create(1).await.unwrap().game_id;
    manager.join_or_create(2).await.unwrap();

    let err = manager.deal_cards(game_id).await.unwrap_err();
    assert!(matches!(err, GameError::InsufficientPlayers { seated: 2 }));
    assert!(store.get_game(game_id).await.unwrap().talon.is_empty());
}

#[tokio::test]
async fn test_concurrent_joins_fill_games_to_three() {
    let (manager, store) = manager_with(true);

    let mut tasks = Vec::new();
    for user_id in 1..=9 {
        let manager = manager.clone();
        tasks.push(tokio::spawn(async move {
            manager.join_or_create(user_id).await
        }));
    }

    let mut game_ids = HashSet::new();
    for task in tasks {
        game_ids.insert(task.await.unwrap().unwrap().game_id);
    }

    assert_eq!(game_ids.len(), 3);
    for game_id in game_ids {
        let seats = store.list_seats(game_id).await.unwrap();
        assert_eq!(seats.len(), 3);
        assert_eq!(
            store.get_game(game_id).await.unwrap().status,
            GameStatus::Bidding
        );
    }
}

#[tokio::test]
async fn test_subscribers_see_every_transition() {
    let (manager, _store) = manager_with(true);
    let mut game_id = 0;
    for user_id in [1, 2, 3] {
        game_id = manager.join_or_create(user_id).await.unwrap().game_id;
    }

    let (tx, mut rx) = mpsc::channel(32);
    manager.subscribe(game_id, 3, tx).await.unwrap();
    assert!(matches!(rx.recv().await, Some(GameEvent::Bidding(_))));

    manager.place_bid(game_id, 1, bid("Meksiko")).await.unwrap();
    match rx.recv().await {
        Some(GameEvent::Bidding(view)) => {
            assert_eq!(view.min_bid, Bid::Meksiko);
            assert_eq!(view.options, vec![bid("Meksiko"), BidOption::Dalje]);
        }
        other => panic!("expected bidding snapshot, got {other:?}"),
    }

    manager.place_bid(game_id, 2, BidOption::Dalje).await.unwrap();
    rx.recv().await.unwrap();
    manager.place_bid(game_id, 3, BidOption::Dalje).await.unwrap();

    let resolved = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .unwrap();
    assert_eq!(
        resolved,
        Some(GameEvent::Resolved {
            game_id,
            outcome: BidOutcome::Won {
                seat: 0,
                bid: Bid::Meksiko
            },
            winner_user_id: Some(1),
        })
    );
}
