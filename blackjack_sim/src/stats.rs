use blackjack_lib::{RoundOutcome, RoundReport};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Record of a single settled round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub result: RoundOutcome,
    /// Total wagered on the round, insurance included.
    pub bet: u64,
    /// Total credited back to the bankroll, insurance included.
    pub payout: u64,
    pub bankroll_after: i64,
    pub was_blackjack: bool,
    pub was_split: bool,
    pub was_doubled: bool,
    pub was_surrendered: bool,
    pub dealer_busted: bool,
    pub player_busted: bool,
}

impl From<&RoundReport> for GameRecord {
    fn from(report: &RoundReport) -> Self {
        GameRecord {
            result: report.outcome,
            bet: u64::from(report.stake) + u64::from(report.insurance_bet),
            payout: report.payout.saturating_add(report.insurance_payout),
            bankroll_after: report.bankroll_after,
            was_blackjack: report.player_blackjack,
            was_split: report.split_requested,
            was_doubled: report.doubled,
            was_surrendered: report.surrendered,
            dealer_busted: report.dealer_bust,
            player_busted: report.player_bust,
        }
    }
}

/// Running totals over any number of `GameRecord`s. Two `Statistics` can be merged, which is how
/// the results of repeated simulations are accumulated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub games_played: u64,
    pub wins: u64,
    pub losses: u64,
    pub pushes: u64,
    pub blackjacks: u64,
    pub doubles: u64,
    pub splits: u64,
    pub surrenders: u64,
    pub player_busts: u64,
    pub dealer_busts: u64,
    pub total_wagered: u64,
    pub total_returned: u64,
}

impl Statistics {
    pub fn new() -> Statistics {
        Statistics::default()
    }

    pub fn record(&mut self, record: &GameRecord) {
        self.games_played += 1;
        match record.result {
            RoundOutcome::Win => self.wins += 1,
            RoundOutcome::Loss => self.losses += 1,
            RoundOutcome::Push => self.pushes += 1,
        }
        self.blackjacks += u64::from(record.was_blackjack);
        self.doubles += u64::from(record.was_doubled);
        self.splits += u64::from(record.was_split);
        self.surrenders += u64::from(record.was_surrendered);
        self.player_busts += u64::from(record.player_busted);
        self.dealer_busts += u64::from(record.dealer_busted);
        self.total_wagered = self.total_wagered.saturating_add(record.bet);
        self.total_returned = self.total_returned.saturating_add(record.payout);
    }

    pub fn merge(&mut self, other: &Statistics) {
        self.games_played += other.games_played;
        self.wins += other.wins;
        self.losses += other.losses;
        self.pushes += other.pushes;
        self.blackjacks += other.blackjacks;
        self.doubles += other.doubles;
        self.splits += other.splits;
        self.surrenders += other.surrenders;
        self.player_busts += other.player_busts;
        self.dealer_busts += other.dealer_busts;
        self.total_wagered = self.total_wagered.saturating_add(other.total_wagered);
        self.total_returned = self.total_returned.saturating_add(other.total_returned);
    }

    /// Wins as a percentage of decided rounds. Pushes are left out.
    pub fn winrate(&self) -> f64 {
        let decided = self.wins + self.losses;
        if decided == 0 {
            return 0.0;
        }
        (self.wins as f64) / (decided as f64) * 100.0
    }

    pub fn net_profit(&self) -> i64 {
        (self.total_returned as i64) - (self.total_wagered as i64)
    }

    /// Net profit as a percentage of the total amount wagered.
    pub fn roi(&self) -> f64 {
        if self.total_wagered == 0 {
            return 0.0;
        }
        (self.net_profit() as f64) / (self.total_wagered as f64) * 100.0
    }

    pub fn average_bet(&self) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        (self.total_wagered as f64) / (self.games_played as f64)
    }

    pub fn reset(&mut self) {
        *self = Statistics::default();
    }

    fn percent_of_games(&self, n: u64) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        (n as f64) / (self.games_played as f64) * 100.0
    }

    pub fn format_summary(&self) -> String {
        const WIDTH: usize = 60;
        const TEXT_WIDTH: usize = "games played:".len() + 8;
        const NUM_WIDTH: usize = WIDTH - TEXT_WIDTH;
        if self.games_played == 0 {
            return "no games recorded".to_string();
        }

        let rows = [
            ("wins:", self.wins),
            ("losses:", self.losses),
            ("pushes:", self.pushes),
            ("blackjacks:", self.blackjacks),
            ("doubles:", self.doubles),
            ("player busts:", self.player_busts),
            ("dealer busts:", self.dealer_busts),
        ];

        let mut out = format!("{:<TEXT_WIDTH$}{:>NUM_WIDTH$}\n", "games played:", self.games_played);
        for (label, n) in rows {
            let value = format!("{} ({:.1}%)", n, self.percent_of_games(n));
            out.push_str(&format!("{:<TEXT_WIDTH$}{:>NUM_WIDTH$}\n", label, value));
        }
        out.push_str(&format!("{:<TEXT_WIDTH$}{:>NUM_WIDTH$.2}\n", "winrate %:", self.winrate()));
        out.push_str(&format!("{:<TEXT_WIDTH$}{:>NUM_WIDTH$}\n", "total wagered:", self.total_wagered));
        out.push_str(&format!("{:<TEXT_WIDTH$}{:>NUM_WIDTH$}\n", "net profit:", self.net_profit()));
        out.push_str(&format!("{:<TEXT_WIDTH$}{:>NUM_WIDTH$.2}", "roi %:", self.roi()));
        out
    }
}

impl Display for Statistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.format_summary())
    }
}
