//! Core of a single seat blackjack game: cards, a multi-deck shoe, hand valuation,
//! the playing strategies and the round controller that ties them together.

pub mod card;
pub mod dealer;
pub mod error;
pub mod hand;
pub mod player;
pub mod shoe;
pub mod strategy;
pub mod table;

pub use card::{Card, Rank, Suit, STANDARD_DECK};
pub use dealer::Dealer;
pub use error::BlackjackGameError;
pub use hand::Hand;
pub use player::Player;
pub use shoe::{Shoe, CARDS_PER_DECK};
pub use table::{BlackjackTable, RoundOutcome, RoundReport, RoundState, TableRules};

pub mod prelude {
    pub use super::strategy::prelude::*;
    pub use super::{
        BlackjackGameError, BlackjackTable, Card, Dealer, Hand, Player, Rank, RoundOutcome,
        RoundReport, RoundState, Shoe, Suit, TableRules,
    };
}
