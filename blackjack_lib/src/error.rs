use crate::table::RoundState;
use thiserror::Error;

/// Errors produced by the blackjack core.
///
/// Most recoverable conditions (an empty shoe, a bet the player cannot cover) surface as values
/// the caller is expected to branch on; only construction-time misuse is reported eagerly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlackjackGameError {
    #[error("a shoe needs at least one deck, got {0}")]
    InvalidDeckCount(usize),
    #[error("bet must be a positive amount")]
    InvalidBet,
    #[error("insufficient funds: bet of {bet} exceeds bankroll of {bankroll}")]
    InsufficientFunds { bet: u32, bankroll: i64 },
    #[error("the shoe has no cards left to deal")]
    ShoeExhausted,
    #[error("unknown strategy `{0}`, expected one of basic, conservative, aggressive, martingale, counting")]
    UnknownStrategy(String),
    #[error("cannot {action} while the round is {state}")]
    InvalidAction {
        action: &'static str,
        state: RoundState,
    },
}
