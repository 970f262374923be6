use crate::card::Card;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// An ordered collection of cards with blackjack specific properties.
/// None of the derived properties are cached, they are recomputed from the cards on every call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hand {
    cards: Vec<Card>,
    split: bool,
    doubled: bool,
    surrendered: bool,
}

impl Hand {
    pub fn new() -> Hand {
        Hand::default()
    }

    pub fn from_cards(cards: Vec<Card>) -> Hand {
        Hand {
            cards,
            ..Hand::default()
        }
    }

    pub fn add_card(&mut self, card: Card) {
        self.cards.push(card);
    }

    /// Removes every card and clears the split, doubled and surrendered flags.
    pub fn clear(&mut self) {
        self.cards.clear();
        self.split = false;
        self.doubled = false;
        self.surrendered = false;
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Sum of the card values with every ace counted as 11.
    pub fn naive_value(&self) -> u32 {
        self.cards.iter().map(|c| c.value() as u32).sum()
    }

    /// Best total for the hand. Aces are demoted from 11 to 1 one at a time while the total is over 21.
    /// The result is still over 21 when demoting every ace is not enough.
    pub fn value(&self) -> u8 {
        let mut total = self.naive_value();
        let mut soft_aces = self.cards.iter().filter(|c| c.is_ace()).count();
        while total > 21 && soft_aces > 0 {
            total -= 10;
            soft_aces -= 1;
        }
        u8::try_from(total).unwrap_or(u8::MAX)
    }

    /// An ace and a ten valued card as the only two cards.
    pub fn is_blackjack(&self) -> bool {
        self.cards.len() == 2
            && self.cards.iter().any(|c| c.is_ace())
            && self.cards.iter().any(|c| c.is_ten_value())
    }

    pub fn is_bust(&self) -> bool {
        self.value() > 21
    }

    /// True while an ace still counts as 11, i.e. the hand holds an ace and the all-aces-high sum does not bust.
    pub fn is_soft(&self) -> bool {
        self.cards.iter().any(|c| c.is_ace()) && self.naive_value() <= 21
    }

    /// Exactly two cards of the same rank.
    pub fn is_pair(&self) -> bool {
        self.cards.len() == 2 && self.cards[0].rank() == self.cards[1].rank()
    }

    pub fn can_split(&self) -> bool {
        self.is_pair() && !self.split
    }

    pub fn can_double_down(&self) -> bool {
        self.cards.len() == 2 && !self.doubled
    }

    pub fn is_split(&self) -> bool {
        self.split
    }

    pub fn is_doubled(&self) -> bool {
        self.doubled
    }

    pub fn is_surrendered(&self) -> bool {
        self.surrendered
    }

    pub fn mark_split(&mut self) {
        self.split = true;
    }

    pub fn mark_doubled(&mut self) {
        self.doubled = true;
    }

    pub fn mark_surrendered(&mut self) {
        self.surrendered = true;
    }
}

impl Display for Hand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cards = self
            .cards
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<String>>()
            .join(" ");
        write!(f, "{} [{}]", cards, self.value())?;
        if self.is_blackjack() {
            write!(f, " BLACKJACK!")
        } else if self.is_bust() {
            write!(f, " BUST!")
        } else if self.is_soft() {
            write!(f, " (soft)")
        } else {
            Ok(())
        }
    }
}
