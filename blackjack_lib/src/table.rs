use crate::card::Card;
use crate::dealer::Dealer;
use crate::error::BlackjackGameError;
use crate::player::Player;
use crate::shoe::Shoe;
use crate::strategy::{Action, PlayingOptions, Strategy};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// The states a round moves through. A fresh table starts in `NotStarted`; after the first
/// round it rests in `Settled` until the next `start_round`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundState {
    NotStarted,
    PlayerTurn,
    DealerTurn,
    Settled,
}

impl Display for RoundState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RoundState::NotStarted => "not started",
            RoundState::PlayerTurn => "on the player's turn",
            RoundState::DealerTurn => "on the dealer's turn",
            RoundState::Settled => "settled",
        };
        write!(f, "{}", s)
    }
}

/// Result of a settled round from the player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundOutcome {
    Win,
    Loss,
    Push,
}

impl Display for RoundOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RoundOutcome::Win => "win",
            RoundOutcome::Loss => "loss",
            RoundOutcome::Push => "push",
        };
        write!(f, "{}", s)
    }
}

/// House rules for a table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableRules {
    /// Fraction of the shoe left at which it is reshuffled before the next round.
    pub reshuffle_threshold: f32,
    /// Allows late surrender on the first two cards.
    pub surrender: bool,
    /// Offers insurance when the dealer shows an ace.
    pub insurance: bool,
}

impl Default for TableRules {
    fn default() -> Self {
        TableRules {
            reshuffle_threshold: 0.25,
            surrender: false,
            insurance: false,
        }
    }
}

/// Everything worth knowing about a round once it has been settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundReport {
    pub outcome: RoundOutcome,
    /// Total main wager, including the extra stake from a double down.
    pub stake: u32,
    /// Amount credited back to the bankroll on the main wager.
    pub payout: u64,
    pub bankroll_after: i64,
    pub player_value: u8,
    pub dealer_value: u8,
    pub player_blackjack: bool,
    pub dealer_blackjack: bool,
    pub doubled: bool,
    pub split_requested: bool,
    pub surrendered: bool,
    pub player_bust: bool,
    pub dealer_bust: bool,
    pub insurance_bet: u32,
    pub insurance_payout: u64,
}

impl RoundReport {
    /// Net change to the bankroll caused by this round, side bet included.
    pub fn net(&self) -> i64 {
        let returned = self.payout.saturating_add(self.insurance_payout);
        let wagered = u64::from(self.stake) + u64::from(self.insurance_bet);
        i64::try_from(returned).unwrap_or(i64::MAX) - i64::try_from(wagered).unwrap_or(i64::MAX)
    }
}

/// Round controller for a single seat. Owns the shoe, the dealer and the player, and advances
/// one round at a time either automatically (`play_auto`) or step by step (`start_round`, `hit`,
/// `stand`, `double_down`, `surrender`).
pub struct BlackjackTable<S: Strategy> {
    shoe: Shoe,
    dealer: Dealer,
    player: Player<S>,
    base_bet: u32,
    rules: TableRules,
    state: RoundState,
    round_bet: u32,
    stake: u32,
    insurance_bet: u32,
    split_requested: bool,
    hole_card_revealed: bool,
    last_round: Option<RoundReport>,
    num_shuffles: u32,
}

impl<S: Strategy> BlackjackTable<S> {
    /// Associated function to create a new `BlackjackTable` with the default house rules.
    pub fn new(shoe: Shoe, player: Player<S>, base_bet: u32) -> BlackjackTable<S> {
        BlackjackTable::with_rules(shoe, player, base_bet, TableRules::default())
    }

    pub fn with_rules(
        shoe: Shoe,
        player: Player<S>,
        base_bet: u32,
        rules: TableRules,
    ) -> BlackjackTable<S> {
        BlackjackTable {
            shoe,
            dealer: Dealer::new(),
            player,
            base_bet,
            rules,
            state: RoundState::NotStarted,
            round_bet: 0,
            stake: 0,
            insurance_bet: 0,
            split_requested: false,
            hole_card_revealed: false,
            last_round: None,
            num_shuffles: 0,
        }
    }

    /// Starts a round: places the stake, deals player, dealer, player, dealer and settles naturals on the spot.
    ///
    /// Returns `Ok(true)` when the player's turn has begun and `Ok(false)` when it has not, either because
    /// the bankroll cannot cover the base bet (nothing is mutated) or because a natural already settled the round.
    /// A shoe that runs dry while dealing voids the round, refunds the stake and returns `ShoeExhausted`.
    pub fn start_round(&mut self) -> Result<bool, BlackjackGameError> {
        if self.is_active() {
            return Err(self.invalid("start a round"));
        }
        if self.base_bet == 0 {
            return Err(BlackjackGameError::InvalidBet);
        }
        if !self.player.can_cover(self.base_bet) {
            debug!(
                "cannot cover base bet of {} with bankroll {}",
                self.base_bet,
                self.player.bankroll()
            );
            return Ok(false);
        }

        if self.shoe.needs_shuffle(self.rules.reshuffle_threshold) {
            debug!("reshuffling {}", self.shoe);
            self.shoe.reshuffle();
            self.num_shuffles += 1;
            self.player.strategy_mut().shoe_shuffled();
        }

        // Bet sizing reads the count against the shoe as it stands now
        self.update_decks_remaining();
        let stake = self.sized_stake();
        self.player.place_bet(stake)?;
        self.round_bet = stake;
        self.stake = stake;
        self.insurance_bet = 0;
        self.split_requested = false;
        self.hole_card_revealed = false;
        self.player.clear_hands();
        self.dealer.clear_hand();
        self.state = RoundState::PlayerTurn;

        for i in 0..2 {
            let card = self.deal_card()?;
            self.player.add_card(card);
            self.show_card(&card);

            let card = self.deal_card()?;
            self.dealer.add_card(card);
            // Only the first dealer card is face up
            if i == 0 {
                self.show_card(&card);
            }
        }
        self.update_decks_remaining();

        if self.rules.insurance {
            self.offer_insurance();
        }

        if self.dealer.hand().is_blackjack() {
            let outcome = if self.player.hand().is_blackjack() {
                self.settle(RoundOutcome::Push, u64::from(self.stake))
            } else {
                self.settle(RoundOutcome::Loss, 0)
            };
            debug!("dealer natural, round settled as {}", outcome);
            return Ok(false);
        }

        if self.player.hand().is_blackjack() {
            // 3:2, floored
            let payout = u64::from(self.stake) * 5 / 2;
            self.settle(RoundOutcome::Win, payout);
            debug!("player natural, paid {}", payout);
            return Ok(false);
        }

        Ok(true)
    }

    /// Deals one card to the player. Returns the outcome if the card busts the hand, `None` while the turn continues.
    pub fn hit(&mut self) -> Result<Option<RoundOutcome>, BlackjackGameError> {
        if self.state != RoundState::PlayerTurn {
            return Err(self.invalid("hit"));
        }
        let card = self.deal_card()?;
        self.player.add_card(card);
        self.show_card(&card);
        self.update_decks_remaining();

        if self.player.hand().is_bust() {
            return Ok(Some(self.settle(RoundOutcome::Loss, 0)));
        }
        Ok(None)
    }

    /// Ends the player's turn, plays the dealer out and settles.
    pub fn stand(&mut self) -> Result<RoundOutcome, BlackjackGameError> {
        if self.state != RoundState::PlayerTurn {
            return Err(self.invalid("stand"));
        }
        self.play_dealer()
    }

    /// Adds a second stake equal to the round's bet, draws exactly one card and ends the turn.
    pub fn double_down(&mut self) -> Result<RoundOutcome, BlackjackGameError> {
        if self.state != RoundState::PlayerTurn || !self.player.hand().can_double_down() {
            return Err(self.invalid("double down"));
        }
        self.player.place_bet(self.round_bet)?;
        self.stake = self.stake.saturating_add(self.round_bet);
        self.player.hand_mut().mark_doubled();

        let card = self.deal_card()?;
        self.player.add_card(card);
        self.show_card(&card);

        if self.player.hand().is_bust() {
            return Ok(self.settle(RoundOutcome::Loss, 0));
        }
        self.play_dealer()
    }

    /// Gives up the hand for half the stake back. Only offered on the first two cards and when the table allows it.
    pub fn surrender(&mut self) -> Result<RoundOutcome, BlackjackGameError> {
        if self.state != RoundState::PlayerTurn
            || !self.rules.surrender
            || self.player.hand().len() != 2
            || self.player.hand().is_doubled()
        {
            return Err(self.invalid("surrender"));
        }
        self.player.hand_mut().mark_surrendered();
        Ok(self.settle(RoundOutcome::Loss, u64::from(self.stake / 2)))
    }

    /// Plays a full round with the player's strategy making every decision.
    ///
    /// The hand is played while its value is under 21. Split and surrender end the turn like a stand,
    /// no second hand is played.
    pub fn play_auto(&mut self) -> Result<RoundOutcome, BlackjackGameError> {
        if !self.player.can_cover(self.base_bet) {
            return Err(BlackjackGameError::InsufficientFunds {
                bet: self.base_bet,
                bankroll: self.player.bankroll(),
            });
        }

        if !self.start_round()? {
            return match (&self.last_round, self.state) {
                (Some(report), RoundState::Settled) => Ok(report.outcome),
                _ => Err(BlackjackGameError::InsufficientFunds {
                    bet: self.base_bet,
                    bankroll: self.player.bankroll(),
                }),
            };
        }

        while self.player.hand().value() < 21 {
            let upcard = match self.dealer.upcard() {
                Some(card) => *card,
                None => break,
            };
            self.update_decks_remaining();

            let options = self.playing_options();
            let action = self
                .player
                .strategy()
                .decide(self.player.hand(), &upcard, options);

            match action {
                Action::Hit => {
                    if let Some(outcome) = self.hit()? {
                        return Ok(outcome);
                    }
                }
                Action::DoubleDown => return self.double_down(),
                Action::Split => {
                    debug!("split requested on {}, standing instead", self.player.hand());
                    self.split_requested = true;
                    break;
                }
                Action::Stand | Action::Surrender | Action::Insurance => break,
            }
        }

        self.stand()
    }

    /// The moves open to the player on the current hand. Doubling also needs the bankroll to cover a second stake.
    pub fn playing_options(&self) -> PlayingOptions {
        let hand = self.player.hand();
        PlayingOptions::new(
            hand.can_double_down() && self.player.can_cover(self.round_bet),
            hand.can_split(),
            self.rules.surrender && hand.len() == 2,
        )
    }

    /// Starts a new session: the player gets `bankroll` and fresh strategy state, the shoe is
    /// rebuilt and reshuffled and the round history is cleared.
    pub fn reset(&mut self, bankroll: i64) {
        self.player.reset(bankroll);
        self.dealer.clear_hand();
        self.shoe.reshuffle();
        self.state = RoundState::NotStarted;
        self.round_bet = 0;
        self.stake = 0;
        self.insurance_bet = 0;
        self.split_requested = false;
        self.hole_card_revealed = false;
        self.last_round = None;
        self.num_shuffles = 0;
    }

    /// True while a round is in progress.
    pub fn is_active(&self) -> bool {
        matches!(self.state, RoundState::PlayerTurn | RoundState::DealerTurn)
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    /// Report of the most recently settled round.
    pub fn last_round(&self) -> Option<&RoundReport> {
        self.last_round.as_ref()
    }

    pub fn shoe(&self) -> &Shoe {
        &self.shoe
    }

    pub fn dealer(&self) -> &Dealer {
        &self.dealer
    }

    pub fn player(&self) -> &Player<S> {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player<S> {
        &mut self.player
    }

    pub fn into_player(self) -> Player<S> {
        self.player
    }

    pub fn base_bet(&self) -> u32 {
        self.base_bet
    }

    pub fn rules(&self) -> &TableRules {
        &self.rules
    }

    /// Total main wager on the table for the current round.
    pub fn stake(&self) -> u32 {
        self.stake
    }

    pub fn num_shuffles(&self) -> u32 {
        self.num_shuffles
    }

    /// Stake for the next round: the base bet scaled by the strategy, capped at the bankroll.
    fn sized_stake(&self) -> u32 {
        let multiplier = u64::from(self.player.strategy().bet_multiplier().max(1));
        let wanted = u64::from(self.base_bet) * multiplier;
        let bankroll = u64::try_from(self.player.bankroll()).unwrap_or(0);
        u32::try_from(u64::min(wanted, bankroll)).unwrap_or(u32::MAX)
    }

    fn offer_insurance(&mut self) {
        let upcard = match self.dealer.upcard() {
            Some(card) if card.is_ace() => *card,
            _ => return,
        };
        if !self
            .player
            .strategy()
            .should_take_insurance(self.player.hand(), &upcard)
        {
            return;
        }
        let side_bet = self.stake / 2;
        if side_bet > 0 && self.player.place_bet(side_bet).is_ok() {
            debug!("insurance of {} taken", side_bet);
            self.insurance_bet = side_bet;
        }
    }

    fn play_dealer(&mut self) -> Result<RoundOutcome, BlackjackGameError> {
        self.state = RoundState::DealerTurn;
        self.reveal_hole_card();
        while self.dealer.should_hit() {
            let card = self.deal_card()?;
            self.dealer.add_card(card);
            self.show_card(&card);
        }
        self.update_decks_remaining();

        let player_value = self.player.hand().value();
        let dealer_value = self.dealer.hand().value();
        let stake = u64::from(self.stake);
        let outcome = if dealer_value > 21 || player_value > dealer_value {
            self.settle(RoundOutcome::Win, stake * 2)
        } else if player_value == dealer_value {
            self.settle(RoundOutcome::Push, stake)
        } else {
            self.settle(RoundOutcome::Loss, 0)
        };
        Ok(outcome)
    }

    /// Credits `payout` plus any insurance winnings, informs the strategy and records the round.
    fn settle(&mut self, outcome: RoundOutcome, payout: u64) -> RoundOutcome {
        self.reveal_hole_card();

        let dealer_blackjack = self.dealer.hand().is_blackjack();
        let insurance_payout = if dealer_blackjack {
            u64::from(self.insurance_bet) * 3
        } else {
            0
        };
        self.player.win(payout + insurance_payout);
        self.player.clear_bet();

        match outcome {
            RoundOutcome::Win => self.player.strategy_mut().record_win(),
            RoundOutcome::Loss => self.player.strategy_mut().record_loss(),
            RoundOutcome::Push => {}
        }

        let hand = self.player.hand();
        let report = RoundReport {
            outcome,
            stake: self.stake,
            payout,
            bankroll_after: self.player.bankroll(),
            player_value: hand.value(),
            dealer_value: self.dealer.hand().value(),
            player_blackjack: hand.is_blackjack(),
            dealer_blackjack,
            doubled: hand.is_doubled(),
            split_requested: self.split_requested,
            surrendered: hand.is_surrendered(),
            player_bust: hand.is_bust(),
            dealer_bust: self.dealer.hand().is_bust(),
            insurance_bet: self.insurance_bet,
            insurance_payout,
        };
        debug!(
            "round settled: {} | player {} | dealer {} | bankroll {}",
            outcome,
            hand,
            self.dealer.hand(),
            report.bankroll_after
        );

        self.last_round = Some(report);
        self.state = RoundState::Settled;
        outcome
    }

    /// Draws from the shoe. An empty shoe voids the round in progress.
    fn deal_card(&mut self) -> Result<Card, BlackjackGameError> {
        match self.shoe.deal() {
            Some(card) => Ok(card),
            None => {
                debug!("shoe ran out mid-round, refunding {}", self.player.current_bet());
                self.player.refund_bet();
                self.stake = 0;
                self.round_bet = 0;
                self.insurance_bet = 0;
                self.state = RoundState::NotStarted;
                Err(BlackjackGameError::ShoeExhausted)
            }
        }
    }

    fn reveal_hole_card(&mut self) {
        if self.hole_card_revealed {
            return;
        }
        if let Some(card) = self.dealer.hole_card().copied() {
            self.show_card(&card);
            self.hole_card_revealed = true;
        }
    }

    fn show_card(&mut self, card: &Card) {
        self.player.strategy_mut().update_count(card);
    }

    fn update_decks_remaining(&mut self) {
        let decks_remaining = self.shoe.decks_remaining();
        self.player
            .strategy_mut()
            .update_decks_remaining(decks_remaining);
    }

    fn invalid(&self, action: &'static str) -> BlackjackGameError {
        BlackjackGameError::InvalidAction {
            action,
            state: self.state,
        }
    }
}
