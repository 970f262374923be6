//! Module that focuses on the simulation of a single session of blackjack, i.e. one bankroll played
//! for a fixed number of hands with one strategy.

use crate::stats::{GameRecord, Statistics};
use blackjack_lib::prelude::*;
use log::{info, warn};
use std::io::{self, Write};

/// Struct that plays automatic rounds on a `BlackjackTable` and records the results of each one.
pub struct BlackjackGameSim<S: Strategy> {
    table: BlackjackTable<S>,
    num_hands: u32,
    pub stats: Statistics,
    pub hands_played: u32,
    /// Rounds cancelled because the shoe ran dry. They are refunded and do not count as hands played.
    pub voided_rounds: u32,
    pub ended_early: bool,
}

impl<S: Strategy> BlackjackGameSim<S> {
    /// Associated method for building a new game.
    /// `num_hands` is the number of hands that will be played during a single call to `self.run()`,
    /// the session only ends sooner if the player can no longer cover the table's base bet.
    pub fn new(table: BlackjackTable<S>, num_hands: u32) -> BlackjackGameSim<S> {
        BlackjackGameSim {
            table,
            num_hands,
            stats: Statistics::new(),
            hands_played: 0,
            voided_rounds: 0,
            ended_early: false,
        }
    }

    /// Plays `num_hands` settled rounds, stopping early once the bankroll cannot cover the base bet.
    pub fn run(&mut self) -> Result<(), BlackjackGameError> {
        while self.hands_played < self.num_hands {
            if !self.table.player().can_cover(self.table.base_bet()) {
                info!(
                    "{} went bankrupt after {} hands with {} left",
                    self.label(),
                    self.hands_played,
                    self.table.player().bankroll()
                );
                self.ended_early = true;
                break;
            }

            match self.table.play_auto() {
                Ok(_) => {
                    if let Some(report) = self.table.last_round() {
                        self.stats.record(&GameRecord::from(report));
                    }
                    self.hands_played += 1;
                }
                // The round was refunded, the next one starts on a reshuffled shoe
                Err(BlackjackGameError::ShoeExhausted) => {
                    self.voided_rounds += 1;
                    warn!("shoe ran out mid-round, round voided");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }

    /// Writes the stats currently recorded to `writer`.
    pub fn display_stats(&self, writer: &mut impl Write) -> io::Result<()> {
        const WIDTH: usize = 60;
        writeln!(writer, "{}", "-".repeat(WIDTH))?;
        writeln!(writer, "{:-^WIDTH$}", format!(" {} ", self.label()))?;
        writeln!(writer, "{}", self.stats)?;
        writeln!(
            writer,
            "{:<21}{:>39}",
            "final bankroll:",
            self.table.player().bankroll()
        )?;
        writeln!(writer, "{:<21}{:>39}", "ended early:", self.ended_early)?;
        writeln!(writer, "{}", "-".repeat(WIDTH))
    }

    /// Resets the game for another session starting from `bankroll`.
    pub fn reset(&mut self, bankroll: i64) {
        self.table.reset(bankroll);
        self.stats.reset();
        self.hands_played = 0;
        self.voided_rounds = 0;
        self.ended_early = false;
    }

    pub fn label(&self) -> String {
        self.table.player().strategy().label()
    }

    pub fn table(&self) -> &BlackjackTable<S> {
        &self.table
    }

    pub fn final_bankroll(&self) -> i64 {
        self.table.player().bankroll()
    }
}
