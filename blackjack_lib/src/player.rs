use crate::card::Card;
use crate::error::BlackjackGameError;
use crate::hand::Hand;
use crate::strategy::Strategy;
use std::fmt::Display;

/// The seated player: a bankroll, the stake currently on the table and the strategy that plays the hands.
///
/// `hands` always holds at least one hand and index 0 is the active one. The extra slots exist for
/// split play, which the round controller does not perform.
pub struct Player<S: Strategy> {
    bankroll: i64,
    initial_bankroll: i64,
    current_bet: u32,
    hands: Vec<Hand>,
    strategy: S,
}

impl<S: Strategy> Player<S> {
    /// Associated function to create a new `Player` struct.
    pub fn new(bankroll: i64, strategy: S) -> Player<S> {
        Player {
            bankroll,
            initial_bankroll: bankroll,
            current_bet: 0,
            hands: vec![Hand::new()],
            strategy,
        }
    }

    /// Moves `amount` from the bankroll onto the table. Fails without touching any state
    /// when the amount is zero or larger than the bankroll.
    pub fn place_bet(&mut self, amount: u32) -> Result<(), BlackjackGameError> {
        if amount == 0 {
            return Err(BlackjackGameError::InvalidBet);
        }
        if i64::from(amount) > self.bankroll {
            return Err(BlackjackGameError::InsufficientFunds {
                bet: amount,
                bankroll: self.bankroll,
            });
        }
        self.bankroll -= i64::from(amount);
        self.current_bet = self.current_bet.saturating_add(amount);
        Ok(())
    }

    /// Credits `amount` to the bankroll.
    pub fn win(&mut self, amount: u64) {
        let amount = i64::try_from(amount).unwrap_or(i64::MAX);
        self.bankroll = self.bankroll.saturating_add(amount);
    }

    /// Returns the stake to the bankroll and clears it, used when a round is voided.
    pub fn refund_bet(&mut self) {
        self.bankroll += i64::from(self.current_bet);
        self.current_bet = 0;
    }

    /// Clears the stake after settlement. The bankroll has already been credited by then.
    pub fn clear_bet(&mut self) {
        self.current_bet = 0;
    }

    pub fn add_card(&mut self, card: Card) {
        self.hands[0].add_card(card);
    }

    /// Starts a fresh session with `bankroll`, clearing the stake, the hands and the strategy's side state.
    pub fn reset(&mut self, bankroll: i64) {
        self.bankroll = bankroll;
        self.initial_bankroll = bankroll;
        self.current_bet = 0;
        self.clear_hands();
        self.strategy.reset();
    }

    /// Drops every hand and starts over with one empty hand.
    pub fn clear_hands(&mut self) {
        self.hands.clear();
        self.hands.push(Hand::new());
    }

    pub fn hand(&self) -> &Hand {
        &self.hands[0]
    }

    pub fn hand_mut(&mut self) -> &mut Hand {
        &mut self.hands[0]
    }

    pub fn hands(&self) -> &[Hand] {
        &self.hands
    }

    pub fn bankroll(&self) -> i64 {
        self.bankroll
    }

    pub fn initial_bankroll(&self) -> i64 {
        self.initial_bankroll
    }

    pub fn current_bet(&self) -> u32 {
        self.current_bet
    }

    pub fn total_profit(&self) -> i64 {
        self.bankroll - self.initial_bankroll
    }

    /// Whether the player can still cover a bet of `amount`.
    pub fn can_cover(&self, amount: u32) -> bool {
        i64::from(amount) <= self.bankroll
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn strategy_mut(&mut self) -> &mut S {
        &mut self.strategy
    }
}

impl<S: Strategy> Display for Player<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} | bankroll: {} | bet: {} | hand: {}",
            self.strategy.label(),
            self.bankroll,
            self.current_bet,
            self.hands[0]
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::strategy::BasicStrategy;

    #[test]
    fn test_place_bet() {
        let mut player = Player::new(100, BasicStrategy::new());
        assert!(player.place_bet(40).is_ok());
        assert_eq!(player.bankroll(), 60);
        assert_eq!(player.current_bet(), 40);

        // Doubling adds to the same stake
        assert!(player.place_bet(40).is_ok());
        assert_eq!(player.current_bet(), 80);
        assert_eq!(player.bankroll(), 20);
    }

    #[test]
    fn test_failed_bet_does_not_mutate() {
        let mut player = Player::new(10, BasicStrategy::new());
        assert_eq!(
            player.place_bet(11),
            Err(BlackjackGameError::InsufficientFunds {
                bet: 11,
                bankroll: 10
            })
        );
        assert_eq!(player.place_bet(0), Err(BlackjackGameError::InvalidBet));
        assert_eq!(player.bankroll(), 10);
        assert_eq!(player.current_bet(), 0);
    }

    #[test]
    fn test_refund_and_profit() {
        let mut player = Player::new(50, BasicStrategy::new());
        player.place_bet(20).unwrap();
        player.refund_bet();
        assert_eq!(player.bankroll(), 50);
        assert_eq!(player.current_bet(), 0);

        player.place_bet(20).unwrap();
        player.win(40);
        player.clear_bet();
        assert_eq!(player.total_profit(), 20);
        assert!(player.can_cover(70));
        assert!(!player.can_cover(71));
    }

    #[test]
    fn test_clear_hands() {
        use crate::card::{Rank, Suit};
        let mut player = Player::new(50, BasicStrategy::new());
        player.add_card(Card::new(Rank::Ace, Suit::Spades));
        player.add_card(Card::new(Rank::King, Suit::Spades));
        assert!(player.hand().is_blackjack());
        player.clear_hands();
        assert!(player.hand().is_empty());
        assert_eq!(player.hands().len(), 1);
    }

    #[test]
    fn test_reset_starts_a_new_session() {
        use crate::strategy::MartingaleStrategy;
        let mut player = Player::new(50, MartingaleStrategy::new());
        player.place_bet(20).unwrap();
        player.strategy_mut().record_loss();
        player.reset(200);
        assert_eq!(player.bankroll(), 200);
        assert_eq!(player.total_profit(), 0);
        assert_eq!(player.current_bet(), 0);
        assert_eq!(player.strategy().bet_multiplier(), 1);
    }
}
