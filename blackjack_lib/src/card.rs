use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::Display;
use std::hash::{Hash, Hasher};

/// The four suits of a standard deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Suit {
    Spades,
    Hearts,
    Diamonds,
    Clubs,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Spades, Suit::Hearts, Suit::Diamonds, Suit::Clubs];

    pub fn symbol(&self) -> &'static str {
        match self {
            Suit::Spades => "♠",
            Suit::Hearts => "♥",
            Suit::Diamonds => "♦",
            Suit::Clubs => "♣",
        }
    }
}

/// Card ranks, each carrying a display symbol and a blackjack value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rank {
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ace => "A",
        }
    }

    /// Nominal blackjack value of the rank. Aces are worth 11 here, the `Hand` decides when one counts as 1.
    pub fn value(&self) -> u8 {
        match self {
            Rank::Two => 2,
            Rank::Three => 3,
            Rank::Four => 4,
            Rank::Five => 5,
            Rank::Six => 6,
            Rank::Seven => 7,
            Rank::Eight => 8,
            Rank::Nine => 9,
            Rank::Ten | Rank::Jack | Rank::Queen | Rank::King => 10,
            Rank::Ace => 11,
        }
    }
}

/// An immutable playing card.
///
/// Equality, ordering and hashing only look at the blackjack value, so `K♠ == Q♥`.
/// Use `rank()` and `suit()` when the exact card matters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Card {
    rank: Rank,
    suit: Suit,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Self {
        Card { rank, suit }
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub fn suit(&self) -> Suit {
        self.suit
    }

    pub fn value(&self) -> u8 {
        self.rank.value()
    }

    pub fn is_ace(&self) -> bool {
        self.rank == Rank::Ace
    }

    pub fn is_face_card(&self) -> bool {
        matches!(self.rank, Rank::Jack | Rank::Queen | Rank::King)
    }

    pub fn is_ten_value(&self) -> bool {
        self.value() == 10
    }
}

impl PartialEq for Card {
    fn eq(&self, other: &Self) -> bool {
        self.value() == other.value()
    }
}

impl Eq for Card {}

impl Hash for Card {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value().hash(state);
    }
}

impl PartialOrd for Card {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Card {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value().cmp(&other.value())
    }
}

impl Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.rank.symbol(), self.suit.symbol())
    }
}

lazy_static! {
    /// One of every rank and suit, in suit-major order.
    pub static ref STANDARD_DECK: Vec<Card> = Suit::ALL
        .iter()
        .flat_map(|suit| Rank::ALL.iter().map(move |rank| Card::new(*rank, *suit)))
        .collect();
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_rank_values() {
        assert_eq!(Rank::Two.value(), 2);
        assert_eq!(Rank::Nine.value(), 9);
        for rank in [Rank::Ten, Rank::Jack, Rank::Queen, Rank::King] {
            assert_eq!(rank.value(), 10);
        }
        assert_eq!(Rank::Ace.value(), 11);
    }

    #[test]
    fn test_card_predicates() {
        let ace = Card::new(Rank::Ace, Suit::Spades);
        let king = Card::new(Rank::King, Suit::Hearts);
        let ten = Card::new(Rank::Ten, Suit::Clubs);
        assert!(ace.is_ace());
        assert!(!ace.is_ten_value());
        assert!(king.is_face_card());
        assert!(king.is_ten_value());
        assert!(!ten.is_face_card());
        assert!(ten.is_ten_value());
    }

    #[test]
    fn test_card_display() {
        assert_eq!(Card::new(Rank::Ace, Suit::Spades).to_string(), "A♠");
        assert_eq!(Card::new(Rank::Ten, Suit::Diamonds).to_string(), "10♦");
        assert_eq!(Card::new(Rank::Queen, Suit::Hearts).to_string(), "Q♥");
    }

    #[test]
    fn test_card_ordering_ignores_suit() {
        let five = Card::new(Rank::Five, Suit::Spades);
        let nine = Card::new(Rank::Nine, Suit::Hearts);
        let king = Card::new(Rank::King, Suit::Clubs);
        let queen = Card::new(Rank::Queen, Suit::Diamonds);
        let other_king = Card::new(Rank::King, Suit::Hearts);
        assert!(five < nine);
        assert!(king > nine);
        assert_eq!(king, other_king);
        assert_eq!(king, queen);
        assert_eq!(king.cmp(&queen), Ordering::Equal);
        assert!(king <= other_king && king >= other_king);
        assert_eq!(Card::new(Rank::Ace, Suit::Spades).max(king).rank(), Rank::Ace);
    }

    #[test]
    fn test_equal_cards_hash_alike() {
        use std::collections::HashSet;
        let tens: HashSet<Card> = [Rank::Ten, Rank::Jack, Rank::Queen, Rank::King]
            .into_iter()
            .map(|rank| Card::new(rank, Suit::Clubs))
            .collect();
        assert_eq!(tens.len(), 1);
    }

    #[test]
    fn test_standard_deck_composition() {
        assert_eq!(STANDARD_DECK.len(), 52);
        let aces = STANDARD_DECK.iter().filter(|c| c.is_ace()).count();
        let tens = STANDARD_DECK.iter().filter(|c| c.is_ten_value()).count();
        assert_eq!(aces, 4);
        assert_eq!(tens, 16);
    }
}
