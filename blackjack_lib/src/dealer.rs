use crate::card::Card;
use crate::hand::Hand;

/// Dealer stands on every 17, soft or hard.
pub const DEALER_STANDS_ON: u8 = 17;

/// The dealer's side of the table. The first card dealt is the upcard, the second is the hole card.
#[derive(Debug, Clone, Default)]
pub struct Dealer {
    hand: Hand,
}

impl Dealer {
    pub fn new() -> Dealer {
        Dealer::default()
    }

    pub fn add_card(&mut self, card: Card) {
        self.hand.add_card(card);
    }

    /// Dealer draws while below 17, with no soft 17 distinction.
    pub fn should_hit(&self) -> bool {
        self.hand.value() < DEALER_STANDS_ON
    }

    pub fn clear_hand(&mut self) {
        self.hand.clear();
    }

    pub fn hand(&self) -> &Hand {
        &self.hand
    }

    pub fn upcard(&self) -> Option<&Card> {
        self.hand.cards().first()
    }

    pub fn hole_card(&self) -> Option<&Card> {
        self.hand.cards().get(1)
    }

    /// Renders the hand, masking the hole card while `hide_hole_card` is set.
    pub fn show_hand(&self, hide_hole_card: bool) -> String {
        if !hide_hole_card {
            return self.hand.to_string();
        }
        match self.upcard() {
            Some(card) => format!("{} ??", card),
            None => String::new(),
        }
    }
}
