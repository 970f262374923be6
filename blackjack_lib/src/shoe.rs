use crate::card::{Card, STANDARD_DECK};
use crate::error::BlackjackGameError;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use std::fmt::Display;

pub const CARDS_PER_DECK: usize = 52;

/// A multi-deck shoe. Cards are pre-shuffled and dealt off the top until the shoe is reset.
///
/// `remaining() + dealt_count() == total_cards()` holds after every operation.
pub struct Shoe {
    // The top of the shoe is the end of the vector.
    cards: Vec<Card>,
    dealt: Vec<Card>,
    num_decks: usize,
    total_cards: usize,
    rng: StdRng,
}

impl Shoe {
    /// Builds a freshly shuffled shoe of `num_decks` standard decks.
    pub fn new(num_decks: usize) -> Result<Shoe, BlackjackGameError> {
        Shoe::build(num_decks, StdRng::from_entropy())
    }

    /// Same as `Shoe::new` but shuffles with a seeded generator, so the deal order is reproducible.
    pub fn with_seed(num_decks: usize, seed: u64) -> Result<Shoe, BlackjackGameError> {
        Shoe::build(num_decks, StdRng::seed_from_u64(seed))
    }

    fn build(num_decks: usize, rng: StdRng) -> Result<Shoe, BlackjackGameError> {
        if num_decks < 1 {
            return Err(BlackjackGameError::InvalidDeckCount(num_decks));
        }
        let mut shoe = Shoe {
            cards: Vec::with_capacity(num_decks * CARDS_PER_DECK),
            dealt: vec![],
            num_decks,
            total_cards: num_decks * CARDS_PER_DECK,
            rng,
        };
        shoe.reset();
        shoe.shuffle();
        Ok(shoe)
    }

    /// Builds a shoe that deals exactly `cards`, first element first. Nothing is shuffled.
    /// The shoe is sized to the cards given; a later `reset` restores full standard decks.
    pub fn stacked(cards: Vec<Card>) -> Shoe {
        let num_decks = usize::max(1, (cards.len() + CARDS_PER_DECK - 1) / CARDS_PER_DECK);
        let total_cards = cards.len();
        let mut cards = cards;
        cards.reverse();
        Shoe {
            cards,
            dealt: vec![],
            num_decks,
            total_cards,
            rng: StdRng::from_entropy(),
        }
    }

    /// Restores every rank and suit `num_decks` times and clears the dealt history. Does not shuffle.
    pub fn reset(&mut self) {
        self.cards.clear();
        for _ in 0..self.num_decks {
            self.cards.extend(STANDARD_DECK.iter().copied());
        }
        self.dealt.clear();
        self.total_cards = self.num_decks * CARDS_PER_DECK;
    }

    /// Shuffles the cards that have not been dealt yet.
    pub fn shuffle(&mut self) {
        self.cards.shuffle(&mut self.rng);
    }

    /// Resets the shoe to its full composition and shuffles it.
    pub fn reshuffle(&mut self) {
        self.reset();
        self.shuffle();
    }

    /// Deals the top card, or `None` once the shoe is empty.
    pub fn deal(&mut self) -> Option<Card> {
        let card = self.cards.pop()?;
        self.dealt.push(card);
        Some(card)
    }

    /// Deals up to `count` cards, stopping early if the shoe runs out.
    pub fn deal_multiple(&mut self, count: usize) -> Vec<Card> {
        let mut cards = Vec::with_capacity(count);
        for _ in 0..count {
            match self.deal() {
                Some(card) => cards.push(card),
                None => break,
            }
        }
        cards
    }

    /// True when the remaining cards have fallen to `threshold` (a fraction of the full shoe) or below.
    pub fn needs_shuffle(&self, threshold: f32) -> bool {
        (self.remaining() as f32) <= (self.total_cards as f32) * threshold
    }

    pub fn remaining(&self) -> usize {
        self.cards.len()
    }

    pub fn dealt_count(&self) -> usize {
        self.dealt.len()
    }

    pub fn total_cards(&self) -> usize {
        self.total_cards
    }

    pub fn num_decks(&self) -> usize {
        self.num_decks
    }

    pub fn dealt_cards(&self) -> &[Card] {
        &self.dealt
    }

    /// Estimated number of decks left in the shoe.
    pub fn decks_remaining(&self) -> f32 {
        (self.remaining() as f32) / (CARDS_PER_DECK as f32)
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl Display for Shoe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Shoe(remaining={}, dealt={}, decks={})",
            self.remaining(),
            self.dealt_count(),
            self.num_decks
        )
    }
}
