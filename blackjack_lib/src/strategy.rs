use crate::card::{Card, Rank};
use crate::error::BlackjackGameError;
use crate::hand::Hand;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::str::FromStr;

pub mod prelude {
    pub use super::{
        Action, AggressiveStrategy, BasicStrategy, CardCountingStrategy, ConservativeStrategy,
        DecisionStrategy, MartingaleStrategy, PlayingOptions, Strategy, StrategyKind,
    };
}

/// Decks assumed to remain in the shoe when the caller has not supplied an estimate.
pub const DEFAULT_DECKS_REMAINING: f32 = 4.0;

/// The moves a player can make. `Insurance` is only ever the answer to the insurance question, never to `decide`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Hit,
    Stand,
    DoubleDown,
    Split,
    Surrender,
    Insurance,
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Action::Hit => "hit",
            Action::Stand => "stand",
            Action::DoubleDown => "double",
            Action::Split => "split",
            Action::Surrender => "surrender",
            Action::Insurance => "insurance",
        };
        write!(f, "{}", s)
    }
}

/// The options the table currently allows for the hand being played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayingOptions {
    pub can_double: bool,
    pub can_split: bool,
    pub can_surrender: bool,
}

impl PlayingOptions {
    pub const ALL: PlayingOptions = PlayingOptions {
        can_double: true,
        can_split: true,
        can_surrender: true,
    };

    pub const NONE: PlayingOptions = PlayingOptions {
        can_double: false,
        can_split: false,
        can_surrender: false,
    };

    pub fn new(can_double: bool, can_split: bool, can_surrender: bool) -> Self {
        PlayingOptions {
            can_double,
            can_split,
            can_surrender,
        }
    }
}

/// Trait for a decision policy. Both methods are total: every reachable hand gets an answer.
pub trait DecisionStrategy {
    /// Returns how the hand should be played against `dealer_upcard`, restricted to what `options` allows.
    fn decide(&self, hand: &Hand, dealer_upcard: &Card, options: PlayingOptions) -> Action;

    /// Returns true when the insurance side bet should be taken against a dealer ace.
    fn should_take_insurance(&self, hand: &Hand, dealer_upcard: &Card) -> bool;
}

/// A complete playing strategy: a decision policy plus whatever side state it keeps for bet sizing.
///
/// The table drives the side state explicitly. Nothing is inferred from gameplay, so the defaults
/// below are no-ops for the stateless strategies.
pub trait Strategy: DecisionStrategy + Send {
    fn label(&self) -> String;

    /// Factor applied to the base bet for the next round.
    fn bet_multiplier(&self) -> u32 {
        1
    }

    fn record_win(&mut self) {}

    fn record_loss(&mut self) {}

    /// Called for every card that becomes visible to the player.
    fn update_count(&mut self, _card: &Card) {}

    /// Called before decisions with the table's estimate of the decks left in the shoe.
    fn update_decks_remaining(&mut self, _decks_remaining: f32) {}

    /// Called when the shoe has been reshuffled.
    fn shoe_shuffled(&mut self) {}

    /// Clears all side state.
    fn reset(&mut self) {}
}

impl<S: DecisionStrategy + ?Sized> DecisionStrategy for Box<S> {
    fn decide(&self, hand: &Hand, dealer_upcard: &Card, options: PlayingOptions) -> Action {
        (**self).decide(hand, dealer_upcard, options)
    }

    fn should_take_insurance(&self, hand: &Hand, dealer_upcard: &Card) -> bool {
        (**self).should_take_insurance(hand, dealer_upcard)
    }
}

impl<S: Strategy + ?Sized> Strategy for Box<S> {
    fn label(&self) -> String {
        (**self).label()
    }

    fn bet_multiplier(&self) -> u32 {
        (**self).bet_multiplier()
    }

    fn record_win(&mut self) {
        (**self).record_win()
    }

    fn record_loss(&mut self) {
        (**self).record_loss()
    }

    fn update_count(&mut self, card: &Card) {
        (**self).update_count(card)
    }

    fn update_decks_remaining(&mut self, decks_remaining: f32) {
        (**self).update_decks_remaining(decks_remaining)
    }

    fn shoe_shuffled(&mut self) {
        (**self).shoe_shuffled()
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

/// An entry in one of the basic strategy lookup tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Play {
    Hit,
    Stand,
    DoubleOrHit,
    DoubleOrStand,
}

impl Play {
    fn resolve(self, can_double: bool) -> Action {
        match self {
            Play::Hit => Action::Hit,
            Play::Stand => Action::Stand,
            Play::DoubleOrHit if can_double => Action::DoubleDown,
            Play::DoubleOrHit => Action::Hit,
            Play::DoubleOrStand if can_double => Action::DoubleDown,
            Play::DoubleOrStand => Action::Stand,
        }
    }
}

/// Decides according to the basic strategy chart. Pairs are looked up first, then soft totals, then hard totals.
/// Dealer upcards are keyed by blackjack value, so an ace is 11.
#[derive(Debug, Clone)]
pub struct BasicStrategy {
    hard_totals: HashMap<(u8, u8), Play>,
    soft_totals: HashMap<(u8, u8), Play>,
    pair_splits: HashSet<(u8, u8)>,
}

impl BasicStrategy {
    /// Associated method for populating the lookup tables used in basic strategy, intended to be a helper method.
    fn build_lookup_tables() -> (
        HashMap<(u8, u8), Play>,
        HashMap<(u8, u8), Play>,
        HashSet<(u8, u8)>,
    ) {
        let mut hard_totals = HashMap::new();
        for i in 2..=31u8 {
            for j in 2..=11u8 {
                let play = match i {
                    17..=31 => Play::Stand,
                    13..=16 if j <= 6 => Play::Stand,
                    12 if (4..=6).contains(&j) => Play::Stand,
                    11 => Play::DoubleOrHit,
                    10 if j <= 9 => Play::DoubleOrHit,
                    9 if (3..=6).contains(&j) => Play::DoubleOrHit,
                    _ => Play::Hit,
                };
                hard_totals.insert((i, j), play);
            }
        }

        // Soft totals are keyed by the resolved value, i.e. with one ace counted as 11
        let mut soft_totals = HashMap::new();
        for i in 11..=21u8 {
            for j in 2..=11u8 {
                let play = match i {
                    19..=21 => Play::Stand,
                    18 => match j {
                        3..=6 => Play::DoubleOrStand,
                        2 | 7 | 8 => Play::Stand,
                        _ => Play::Hit,
                    },
                    17 if (3..=6).contains(&j) => Play::DoubleOrHit,
                    15 | 16 if (4..=6).contains(&j) => Play::DoubleOrHit,
                    13 | 14 if (5..=6).contains(&j) => Play::DoubleOrHit,
                    _ => Play::Hit,
                };
                soft_totals.insert((i, j), play);
            }
        }

        // Pairs are keyed by the value of one card of the pair
        let mut pair_splits = HashSet::new();
        for i in 2..=11u8 {
            for j in 2..=11u8 {
                let split = match i {
                    11 | 8 => true,
                    10 | 5 => false,
                    9 => !matches!(j, 7 | 10 | 11),
                    2 | 3 | 7 => (2..=7).contains(&j),
                    4 => matches!(j, 5 | 6),
                    6 => (2..=6).contains(&j),
                    _ => false,
                };
                if split {
                    pair_splits.insert((i, j));
                }
            }
        }

        (hard_totals, soft_totals, pair_splits)
    }

    /// Associated method for creating a new `BasicStrategy` struct.
    pub fn new() -> BasicStrategy {
        let (hard_totals, soft_totals, pair_splits) = BasicStrategy::build_lookup_tables();
        BasicStrategy {
            hard_totals,
            soft_totals,
            pair_splits,
        }
    }
}

impl Default for BasicStrategy {
    fn default() -> Self {
        BasicStrategy::new()
    }
}

impl DecisionStrategy for BasicStrategy {
    fn decide(&self, hand: &Hand, dealer_upcard: &Card, options: PlayingOptions) -> Action {
        let player_value = hand.value();
        let dealer_value = dealer_upcard.value();

        if options.can_split && hand.is_pair() {
            let pair_value = hand.cards()[0].value();
            if self.pair_splits.contains(&(pair_value, dealer_value)) {
                return Action::Split;
            }
        }

        let table = if hand.is_soft() {
            &self.soft_totals
        } else {
            &self.hard_totals
        };

        // Only hands with fewer than two cards fall outside the tables
        let play = table
            .get(&(player_value, dealer_value))
            .copied()
            .unwrap_or(if player_value >= 17 {
                Play::Stand
            } else {
                Play::Hit
            });

        play.resolve(options.can_double)
    }

    fn should_take_insurance(&self, _hand: &Hand, _dealer_upcard: &Card) -> bool {
        false
    }
}

impl Strategy for BasicStrategy {
    fn label(&self) -> String {
        "Basic Strategy".to_string()
    }
}

/// Risk averse caricature: only splits aces, stands on any 12 or better and always insures.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConservativeStrategy;

impl ConservativeStrategy {
    pub fn new() -> ConservativeStrategy {
        ConservativeStrategy
    }
}

impl DecisionStrategy for ConservativeStrategy {
    fn decide(&self, hand: &Hand, _dealer_upcard: &Card, options: PlayingOptions) -> Action {
        if options.can_split && hand.is_pair() && hand.cards()[0].is_ace() {
            return Action::Split;
        }
        if hand.value() >= 12 {
            Action::Stand
        } else {
            Action::Hit
        }
    }

    fn should_take_insurance(&self, _hand: &Hand, _dealer_upcard: &Card) -> bool {
        true
    }
}

impl Strategy for ConservativeStrategy {
    fn label(&self) -> String {
        "Conservative".to_string()
    }
}

/// Splits nearly every pair, doubles on 9 through 12 and keeps hitting until 18.
#[derive(Debug, Clone, Copy, Default)]
pub struct AggressiveStrategy;

impl AggressiveStrategy {
    pub fn new() -> AggressiveStrategy {
        AggressiveStrategy
    }
}

impl DecisionStrategy for AggressiveStrategy {
    fn decide(&self, hand: &Hand, _dealer_upcard: &Card, options: PlayingOptions) -> Action {
        let player_value = hand.value();

        if options.can_split && hand.is_pair() {
            let card = hand.cards()[0];
            if !card.is_ten_value() && card.rank() != Rank::Five {
                return Action::Split;
            }
        }

        if options.can_double && (9..=12).contains(&player_value) {
            return Action::DoubleDown;
        }

        if player_value < 18 {
            Action::Hit
        } else {
            Action::Stand
        }
    }

    fn should_take_insurance(&self, _hand: &Hand, _dealer_upcard: &Card) -> bool {
        false
    }
}

impl Strategy for AggressiveStrategy {
    fn label(&self) -> String {
        "Aggressive".to_string()
    }
}

/// Plays basic strategy and doubles the bet multiplier after every recorded loss.
#[derive(Debug, Clone)]
pub struct MartingaleStrategy {
    basic_strategy: BasicStrategy,
    consecutive_losses: u32,
}

impl MartingaleStrategy {
    pub fn new() -> MartingaleStrategy {
        MartingaleStrategy {
            basic_strategy: BasicStrategy::new(),
            consecutive_losses: 0,
        }
    }

    pub fn consecutive_losses(&self) -> u32 {
        self.consecutive_losses
    }
}

impl Default for MartingaleStrategy {
    fn default() -> Self {
        MartingaleStrategy::new()
    }
}

impl DecisionStrategy for MartingaleStrategy {
    fn decide(&self, hand: &Hand, dealer_upcard: &Card, options: PlayingOptions) -> Action {
        self.basic_strategy.decide(hand, dealer_upcard, options)
    }

    fn should_take_insurance(&self, hand: &Hand, dealer_upcard: &Card) -> bool {
        self.basic_strategy.should_take_insurance(hand, dealer_upcard)
    }
}

impl Strategy for MartingaleStrategy {
    fn label(&self) -> String {
        "Martingale".to_string()
    }

    /// 2 to the power of the current losing streak, saturating at `u32::MAX`.
    fn bet_multiplier(&self) -> u32 {
        1u32.checked_shl(self.consecutive_losses)
            .unwrap_or(u32::MAX)
    }

    fn record_win(&mut self) {
        self.consecutive_losses = 0;
    }

    fn record_loss(&mut self) {
        self.consecutive_losses = self.consecutive_losses.saturating_add(1);
        debug!(
            "martingale losing streak at {}, next multiplier {}",
            self.consecutive_losses,
            self.bet_multiplier()
        );
    }

    fn reset(&mut self) {
        self.consecutive_losses = 0;
    }
}

/// Hi-Lo card counter. Plays basic strategy, sizes bets off the true count and insures at a true count of +3 or more.
#[derive(Debug, Clone)]
pub struct CardCountingStrategy {
    basic_strategy: BasicStrategy,
    running_count: i32,
    cards_seen: u32,
    decks_remaining: f32,
    lookup_table: HashMap<Rank, i32>,
}

impl CardCountingStrategy {
    pub fn new() -> CardCountingStrategy {
        // Initialize Hi-Lo lookup table
        let mut lookup_table = HashMap::new();
        for rank in [Rank::Two, Rank::Three, Rank::Four, Rank::Five, Rank::Six] {
            lookup_table.insert(rank, 1);
        }
        for rank in [Rank::Seven, Rank::Eight, Rank::Nine] {
            lookup_table.insert(rank, 0);
        }
        for rank in [Rank::Ten, Rank::Jack, Rank::Queen, Rank::King, Rank::Ace] {
            lookup_table.insert(rank, -1);
        }

        CardCountingStrategy {
            basic_strategy: BasicStrategy::new(),
            running_count: 0,
            cards_seen: 0,
            decks_remaining: DEFAULT_DECKS_REMAINING,
            lookup_table,
        }
    }

    pub fn running_count(&self) -> i32 {
        self.running_count
    }

    pub fn cards_seen(&self) -> u32 {
        self.cards_seen
    }

    /// Last decks-remaining estimate supplied by the table.
    pub fn decks_remaining(&self) -> f32 {
        self.decks_remaining
    }

    /// True count against the most recent decks-remaining estimate.
    pub fn true_count(&self) -> f32 {
        self.true_count_for(self.decks_remaining)
    }

    /// Running count divided by `decks_remaining`. A non-positive estimate yields 0.
    pub fn true_count_for(&self, decks_remaining: f32) -> f32 {
        if decks_remaining <= 0.0 {
            return 0.0;
        }
        (self.running_count as f32) / decks_remaining
    }

    /// Maps a true count onto the discrete bet ramp.
    pub fn bet_multiplier_for(true_count: f32) -> u32 {
        if true_count >= 5.0 {
            8
        } else if true_count >= 4.0 {
            6
        } else if true_count >= 3.0 {
            4
        } else if true_count >= 2.0 {
            2
        } else {
            1
        }
    }
}

impl Default for CardCountingStrategy {
    fn default() -> Self {
        CardCountingStrategy::new()
    }
}

impl DecisionStrategy for CardCountingStrategy {
    fn decide(&self, hand: &Hand, dealer_upcard: &Card, options: PlayingOptions) -> Action {
        self.basic_strategy.decide(hand, dealer_upcard, options)
    }

    fn should_take_insurance(&self, _hand: &Hand, _dealer_upcard: &Card) -> bool {
        self.true_count() >= 3.0
    }
}

impl Strategy for CardCountingStrategy {
    fn label(&self) -> String {
        "Card Counting".to_string()
    }

    fn bet_multiplier(&self) -> u32 {
        CardCountingStrategy::bet_multiplier_for(self.true_count())
    }

    fn update_count(&mut self, card: &Card) {
        self.running_count += self.lookup_table[&card.rank()];
        self.cards_seen += 1;
    }

    fn update_decks_remaining(&mut self, decks_remaining: f32) {
        self.decks_remaining = decks_remaining;
    }

    fn shoe_shuffled(&mut self) {
        debug!(
            "shoe shuffled, dropping running count of {} after {} cards",
            self.running_count, self.cards_seen
        );
        self.reset();
    }

    fn reset(&mut self) {
        self.running_count = 0;
        self.cards_seen = 0;
    }
}

impl Display for CardCountingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let width = "total cards counted:".len();
        write!(
            f,
            "{:<width$} {}\n{:<width$} {}\n{:<width$} {:.2}",
            "running count:",
            self.running_count,
            "total cards counted:",
            self.cards_seen,
            "true count:",
            self.true_count(),
        )
    }
}

/// The built-in strategies, selectable by name at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Basic,
    Conservative,
    Aggressive,
    Martingale,
    Counting,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::Basic,
        StrategyKind::Conservative,
        StrategyKind::Aggressive,
        StrategyKind::Martingale,
        StrategyKind::Counting,
    ];

    /// Builds a fresh strategy of this kind as a trait object.
    pub fn build(&self) -> Box<dyn Strategy> {
        match self {
            StrategyKind::Basic => Box::new(BasicStrategy::new()),
            StrategyKind::Conservative => Box::new(ConservativeStrategy::new()),
            StrategyKind::Aggressive => Box::new(AggressiveStrategy::new()),
            StrategyKind::Martingale => Box::new(MartingaleStrategy::new()),
            StrategyKind::Counting => Box::new(CardCountingStrategy::new()),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = BlackjackGameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "basic" => Ok(StrategyKind::Basic),
            "conservative" => Ok(StrategyKind::Conservative),
            "aggressive" => Ok(StrategyKind::Aggressive),
            "martingale" => Ok(StrategyKind::Martingale),
            "counting" | "card-counting" => Ok(StrategyKind::Counting),
            _ => Err(BlackjackGameError::UnknownStrategy(s.to_string())),
        }
    }
}

impl Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StrategyKind::Basic => "basic",
            StrategyKind::Conservative => "conservative",
            StrategyKind::Aggressive => "aggressive",
            StrategyKind::Martingale => "martingale",
            StrategyKind::Counting => "counting",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::card::Suit;

    fn card(rank: Rank) -> Card {
        Card::new(rank, Suit::Clubs)
    }

    fn hand(ranks: &[Rank]) -> Hand {
        Hand::from_cards(ranks.iter().map(|r| Card::new(*r, Suit::Hearts)).collect())
    }

    #[test]
    fn test_basic_always_splits_aces_and_eights() {
        let basic = BasicStrategy::new();
        for upcard in Rank::ALL {
            assert_eq!(
                basic.decide(&hand(&[Rank::Ace, Rank::Ace]), &card(upcard), PlayingOptions::ALL),
                Action::Split
            );
            assert_eq!(
                basic.decide(&hand(&[Rank::Eight, Rank::Eight]), &card(upcard), PlayingOptions::ALL),
                Action::Split
            );
        }
    }

    #[test]
    fn test_basic_never_splits_tens_or_fives() {
        let basic = BasicStrategy::new();
        for upcard in Rank::ALL {
            let tens = basic.decide(&hand(&[Rank::King, Rank::King]), &card(upcard), PlayingOptions::ALL);
            assert_eq!(tens, Action::Stand);
            let fives = basic.decide(&hand(&[Rank::Five, Rank::Five]), &card(upcard), PlayingOptions::ALL);
            assert_ne!(fives, Action::Split);
        }
        // A pair of fives plays as a hard 10
        assert_eq!(
            basic.decide(&hand(&[Rank::Five, Rank::Five]), &card(Rank::Six), PlayingOptions::ALL),
            Action::DoubleDown
        );
    }

    #[test]
    fn test_basic_nines_pair() {
        let basic = BasicStrategy::new();
        let nines = hand(&[Rank::Nine, Rank::Nine]);
        assert_eq!(basic.decide(&nines, &card(Rank::Six), PlayingOptions::ALL), Action::Split);
        assert_eq!(basic.decide(&nines, &card(Rank::Eight), PlayingOptions::ALL), Action::Split);
        assert_eq!(basic.decide(&nines, &card(Rank::Seven), PlayingOptions::ALL), Action::Stand);
        assert_eq!(basic.decide(&nines, &card(Rank::Queen), PlayingOptions::ALL), Action::Stand);
        assert_eq!(basic.decide(&nines, &card(Rank::Ace), PlayingOptions::ALL), Action::Stand);
    }

    #[test]
    fn test_basic_small_pairs() {
        let basic = BasicStrategy::new();
        let fours = hand(&[Rank::Four, Rank::Four]);
        assert_eq!(basic.decide(&fours, &card(Rank::Five), PlayingOptions::ALL), Action::Split);
        assert_eq!(basic.decide(&fours, &card(Rank::Four), PlayingOptions::ALL), Action::Hit);

        let sixes = hand(&[Rank::Six, Rank::Six]);
        assert_eq!(basic.decide(&sixes, &card(Rank::Two), PlayingOptions::ALL), Action::Split);
        assert_eq!(basic.decide(&sixes, &card(Rank::Seven), PlayingOptions::ALL), Action::Hit);

        let sevens = hand(&[Rank::Seven, Rank::Seven]);
        assert_eq!(basic.decide(&sevens, &card(Rank::Seven), PlayingOptions::ALL), Action::Split);
        assert_eq!(basic.decide(&sevens, &card(Rank::Eight), PlayingOptions::ALL), Action::Hit);
    }

    #[test]
    fn test_basic_respects_split_option() {
        let basic = BasicStrategy::new();
        let no_split = PlayingOptions::new(true, false, false);
        // Eights without a split are a hard 16
        assert_eq!(
            basic.decide(&hand(&[Rank::Eight, Rank::Eight]), &card(Rank::Ten), no_split),
            Action::Hit
        );
        assert_eq!(
            basic.decide(&hand(&[Rank::Eight, Rank::Eight]), &card(Rank::Five), no_split),
            Action::Stand
        );
    }

    #[test]
    fn test_basic_soft_totals() {
        let basic = BasicStrategy::new();
        let soft_19 = hand(&[Rank::Ace, Rank::Eight]);
        assert_eq!(basic.decide(&soft_19, &card(Rank::Six), PlayingOptions::ALL), Action::Stand);

        let soft_18 = hand(&[Rank::Ace, Rank::Seven]);
        assert_eq!(basic.decide(&soft_18, &card(Rank::Four), PlayingOptions::ALL), Action::DoubleDown);
        assert_eq!(basic.decide(&soft_18, &card(Rank::Four), PlayingOptions::NONE), Action::Stand);
        assert_eq!(basic.decide(&soft_18, &card(Rank::Two), PlayingOptions::ALL), Action::Stand);
        assert_eq!(basic.decide(&soft_18, &card(Rank::Eight), PlayingOptions::ALL), Action::Stand);
        assert_eq!(basic.decide(&soft_18, &card(Rank::Nine), PlayingOptions::ALL), Action::Hit);
        assert_eq!(basic.decide(&soft_18, &card(Rank::Ace), PlayingOptions::ALL), Action::Hit);

        let soft_17 = hand(&[Rank::Ace, Rank::Six]);
        assert_eq!(basic.decide(&soft_17, &card(Rank::Three), PlayingOptions::ALL), Action::DoubleDown);
        assert_eq!(basic.decide(&soft_17, &card(Rank::Three), PlayingOptions::NONE), Action::Hit);
        assert_eq!(basic.decide(&soft_17, &card(Rank::Two), PlayingOptions::ALL), Action::Hit);

        let soft_16 = hand(&[Rank::Ace, Rank::Five]);
        assert_eq!(basic.decide(&soft_16, &card(Rank::Four), PlayingOptions::ALL), Action::DoubleDown);
        assert_eq!(basic.decide(&soft_16, &card(Rank::Three), PlayingOptions::ALL), Action::Hit);

        let soft_13 = hand(&[Rank::Ace, Rank::Two]);
        assert_eq!(basic.decide(&soft_13, &card(Rank::Five), PlayingOptions::ALL), Action::DoubleDown);
        assert_eq!(basic.decide(&soft_13, &card(Rank::Four), PlayingOptions::ALL), Action::Hit);
    }

    #[test]
    fn test_basic_three_card_soft_hand() {
        let basic = BasicStrategy::new();
        // A,2,4 is a soft 17 that can no longer double
        let h = hand(&[Rank::Ace, Rank::Two, Rank::Four]);
        let options = PlayingOptions::new(h.can_double_down(), h.can_split(), false);
        assert_eq!(basic.decide(&h, &card(Rank::Five), options), Action::Hit);
    }

    #[test]
    fn test_basic_hard_totals() {
        let basic = BasicStrategy::new();
        let hard_16 = hand(&[Rank::Ten, Rank::Six]);
        assert_eq!(basic.decide(&hard_16, &card(Rank::Ten), PlayingOptions::ALL), Action::Hit);
        assert_eq!(basic.decide(&hard_16, &card(Rank::Six), PlayingOptions::ALL), Action::Stand);

        let hard_12 = hand(&[Rank::Ten, Rank::Two]);
        assert_eq!(basic.decide(&hard_12, &card(Rank::Three), PlayingOptions::ALL), Action::Hit);
        assert_eq!(basic.decide(&hard_12, &card(Rank::Four), PlayingOptions::ALL), Action::Stand);
        assert_eq!(basic.decide(&hard_12, &card(Rank::Seven), PlayingOptions::ALL), Action::Hit);

        let hard_11 = hand(&[Rank::Six, Rank::Five]);
        assert_eq!(basic.decide(&hard_11, &card(Rank::Ace), PlayingOptions::ALL), Action::DoubleDown);
        assert_eq!(basic.decide(&hard_11, &card(Rank::Ace), PlayingOptions::NONE), Action::Hit);

        let hard_10 = hand(&[Rank::Six, Rank::Four]);
        assert_eq!(basic.decide(&hard_10, &card(Rank::Nine), PlayingOptions::ALL), Action::DoubleDown);
        assert_eq!(basic.decide(&hard_10, &card(Rank::Ten), PlayingOptions::ALL), Action::Hit);

        let hard_9 = hand(&[Rank::Six, Rank::Three]);
        assert_eq!(basic.decide(&hard_9, &card(Rank::Three), PlayingOptions::ALL), Action::DoubleDown);
        assert_eq!(basic.decide(&hard_9, &card(Rank::Two), PlayingOptions::ALL), Action::Hit);

        let hard_8 = hand(&[Rank::Six, Rank::Two]);
        assert_eq!(basic.decide(&hard_8, &card(Rank::Six), PlayingOptions::ALL), Action::Hit);

        let hard_17 = hand(&[Rank::Ten, Rank::Seven]);
        assert_eq!(basic.decide(&hard_17, &card(Rank::Ace), PlayingOptions::ALL), Action::Stand);
    }

    #[test]
    fn test_basic_is_total_over_odd_hands() {
        let basic = BasicStrategy::new();
        let busted = hand(&[Rank::King, Rank::Queen, Rank::Jack]);
        assert_eq!(basic.decide(&busted, &card(Rank::Two), PlayingOptions::ALL), Action::Stand);
        let single = hand(&[Rank::Two]);
        assert_eq!(basic.decide(&single, &card(Rank::Two), PlayingOptions::ALL), Action::Hit);
        let empty = Hand::new();
        assert_eq!(basic.decide(&empty, &card(Rank::Two), PlayingOptions::ALL), Action::Hit);
        assert!(!basic.should_take_insurance(&busted, &card(Rank::Ace)));
    }

    #[test]
    fn test_conservative() {
        let conservative = ConservativeStrategy::new();
        let upcard = card(Rank::Ten);
        assert_eq!(
            conservative.decide(&hand(&[Rank::Ace, Rank::Ace]), &upcard, PlayingOptions::ALL),
            Action::Split
        );
        assert_eq!(
            conservative.decide(&hand(&[Rank::Eight, Rank::Eight]), &upcard, PlayingOptions::ALL),
            Action::Stand
        );
        assert_eq!(
            conservative.decide(&hand(&[Rank::Ten, Rank::Two]), &upcard, PlayingOptions::ALL),
            Action::Stand
        );
        assert_eq!(
            conservative.decide(&hand(&[Rank::Six, Rank::Five]), &upcard, PlayingOptions::ALL),
            Action::Hit
        );
        assert!(conservative.should_take_insurance(&hand(&[Rank::Two, Rank::Three]), &card(Rank::Ace)));
    }

    #[test]
    fn test_aggressive() {
        let aggressive = AggressiveStrategy::new();
        let upcard = card(Rank::Seven);
        assert_eq!(
            aggressive.decide(&hand(&[Rank::Four, Rank::Four]), &upcard, PlayingOptions::ALL),
            Action::Split
        );
        assert_eq!(
            aggressive.decide(&hand(&[Rank::Jack, Rank::Jack]), &upcard, PlayingOptions::ALL),
            Action::Stand
        );
        // 5,5 is not split but doubled as a 10
        assert_eq!(
            aggressive.decide(&hand(&[Rank::Five, Rank::Five]), &upcard, PlayingOptions::ALL),
            Action::DoubleDown
        );
        assert_eq!(
            aggressive.decide(&hand(&[Rank::Ten, Rank::Two]), &upcard, PlayingOptions::ALL),
            Action::DoubleDown
        );
        assert_eq!(
            aggressive.decide(&hand(&[Rank::Ten, Rank::Two]), &upcard, PlayingOptions::NONE),
            Action::Hit
        );
        assert_eq!(
            aggressive.decide(&hand(&[Rank::Ten, Rank::Seven]), &upcard, PlayingOptions::ALL),
            Action::Hit
        );
        assert_eq!(
            aggressive.decide(&hand(&[Rank::Ten, Rank::Eight]), &upcard, PlayingOptions::ALL),
            Action::Stand
        );
        assert!(!aggressive.should_take_insurance(&hand(&[Rank::Ten, Rank::Eight]), &card(Rank::Ace)));
    }

    #[test]
    fn test_martingale_multiplier_sequence() {
        let mut martingale = MartingaleStrategy::new();
        let mut expected = 1;
        for _ in 0..6 {
            assert_eq!(martingale.bet_multiplier(), expected);
            martingale.record_loss();
            expected *= 2;
        }
        assert_eq!(martingale.bet_multiplier(), 64);
        martingale.record_win();
        assert_eq!(martingale.bet_multiplier(), 1);

        martingale.record_loss();
        martingale.record_loss();
        martingale.reset();
        assert_eq!(martingale.bet_multiplier(), 1);
    }

    #[test]
    fn test_martingale_multiplier_saturates() {
        let mut martingale = MartingaleStrategy::new();
        for _ in 0..40 {
            martingale.record_loss();
        }
        assert_eq!(martingale.bet_multiplier(), u32::MAX);
    }

    #[test]
    fn test_delegating_strategies_match_basic() {
        let basic = BasicStrategy::new();
        let martingale = MartingaleStrategy::new();
        let counting = CardCountingStrategy::new();
        let hands = [
            hand(&[Rank::Ten, Rank::Six]),
            hand(&[Rank::Ace, Rank::Seven]),
            hand(&[Rank::Nine, Rank::Nine]),
            hand(&[Rank::Six, Rank::Five]),
        ];
        for h in hands.iter() {
            for upcard in Rank::ALL {
                let expected = basic.decide(h, &card(upcard), PlayingOptions::ALL);
                assert_eq!(martingale.decide(h, &card(upcard), PlayingOptions::ALL), expected);
                assert_eq!(counting.decide(h, &card(upcard), PlayingOptions::ALL), expected);
            }
        }
    }

    #[test]
    fn test_hi_lo_full_rank_cycle_is_balanced() {
        let mut counting = CardCountingStrategy::new();
        for rank in Rank::ALL {
            counting.update_count(&card(rank));
        }
        assert_eq!(counting.running_count(), 0);
        assert_eq!(counting.cards_seen(), 13);
    }

    #[test]
    fn test_hi_lo_values() {
        let mut counting = CardCountingStrategy::new();
        for rank in [Rank::Two, Rank::Three, Rank::Four, Rank::Five, Rank::Six] {
            counting.update_count(&card(rank));
        }
        assert_eq!(counting.running_count(), 5);
        for rank in [Rank::Seven, Rank::Eight, Rank::Nine] {
            counting.update_count(&card(rank));
        }
        assert_eq!(counting.running_count(), 5);
        counting.update_count(&card(Rank::Ace));
        counting.update_count(&card(Rank::Jack));
        assert_eq!(counting.running_count(), 3);
    }

    #[test]
    fn test_true_count_and_bet_ramp() {
        let mut counting = CardCountingStrategy::new();
        for _ in 0..12 {
            counting.update_count(&card(Rank::Five));
        }
        // 12 / 4 default decks
        assert_eq!(counting.true_count(), 3.0);
        assert_eq!(counting.bet_multiplier(), 4);
        assert!(counting.should_take_insurance(&Hand::new(), &card(Rank::Ace)));

        assert_eq!(counting.true_count_for(2.0), 6.0);
        assert_eq!(counting.true_count_for(0.0), 0.0);
        assert_eq!(counting.true_count_for(-1.0), 0.0);

        counting.update_decks_remaining(6.0);
        assert_eq!(counting.true_count(), 2.0);
        assert_eq!(counting.bet_multiplier(), 2);
        assert!(!counting.should_take_insurance(&Hand::new(), &card(Rank::Ace)));

        counting.update_decks_remaining(0.0);
        assert_eq!(counting.bet_multiplier(), 1);
    }

    #[test]
    fn test_bet_ramp_thresholds() {
        assert_eq!(CardCountingStrategy::bet_multiplier_for(7.5), 8);
        assert_eq!(CardCountingStrategy::bet_multiplier_for(5.0), 8);
        assert_eq!(CardCountingStrategy::bet_multiplier_for(4.9), 6);
        assert_eq!(CardCountingStrategy::bet_multiplier_for(4.0), 6);
        assert_eq!(CardCountingStrategy::bet_multiplier_for(3.0), 4);
        assert_eq!(CardCountingStrategy::bet_multiplier_for(2.0), 2);
        assert_eq!(CardCountingStrategy::bet_multiplier_for(1.99), 1);
        assert_eq!(CardCountingStrategy::bet_multiplier_for(-3.0), 1);
    }

    #[test]
    fn test_counting_reset_on_shuffle() {
        let mut counting = CardCountingStrategy::new();
        counting.update_count(&card(Rank::Two));
        counting.update_count(&card(Rank::Three));
        counting.shoe_shuffled();
        assert_eq!(counting.running_count(), 0);
        assert_eq!(counting.cards_seen(), 0);
    }

    #[test]
    fn test_strategy_kind_round_trip() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.to_string().parse::<StrategyKind>().unwrap(), kind);
        }
        assert_eq!("Card-Counting".parse::<StrategyKind>().unwrap(), StrategyKind::Counting);
        assert!("hunch".parse::<StrategyKind>().is_err());
        assert_eq!(StrategyKind::Martingale.build().label(), "Martingale");
    }

    #[test]
    fn test_dynamic_strategy_creation() {
        let mut strategies: Vec<Box<dyn Strategy>> = StrategyKind::ALL.iter().map(|k| k.build()).collect();
        for strategy in strategies.iter_mut() {
            strategy.record_loss();
            let action = strategy.decide(&hand(&[Rank::Ten, Rank::Six]), &card(Rank::Ten), PlayingOptions::ALL);
            assert_ne!(action, Action::Insurance);
        }
        assert_eq!(strategies[3].bet_multiplier(), 2);
        assert_eq!(strategies[0].bet_multiplier(), 1);
    }
}
