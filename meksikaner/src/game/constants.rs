//! Fixed table and deck dimensions.

/// Seats at every Meksikaner table.
pub const PLAYERS_PER_GAME: usize = 3;

/// Cards in a full deck (4 suits x 8 ranks).
pub const DECK_SIZE: usize = 32;

/// Cards dealt to each seat.
pub const HAND_SIZE: usize = 10;

/// Cards left face down after the deal.
pub const TALON_SIZE: usize = 2;

/// Floor of every fresh bidding round.
pub const OPENING_BID: u8 = 5;

/// Highest numeric bid. Anything above is "Meksiko".
pub const MAX_NUMERIC_BID: u8 = 10;

const _: () = assert!(PLAYERS_PER_GAME * HAND_SIZE + TALON_SIZE == DECK_SIZE);
