pub mod game;
pub mod stats;
pub mod write;

use blackjack_lib::prelude::*;
use game::BlackjackGameSim;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use stats::Statistics;
use std::fmt::Display;
use std::io::Write;
use std::sync::mpsc;
use std::thread;
use thiserror::Error;

pub mod prelude {
    pub use super::{
        game::BlackjackGameSim,
        stats::{GameRecord, Statistics},
        BlackjackSimulation, BlackjackSimulator, BlackjackSimulatorConfig,
        BlackjackSimulatorConfigBuilder, MulStrategyBlackjackSimulator,
        MulStrategyBlackjackSimulatorBuilder, SimulationError, SimulationSummary,
    };
    pub use blackjack_lib::prelude::*;
}

/// Deck counts a simulation can be configured with.
pub const ALLOWED_DECK_COUNTS: [usize; 5] = [1, 2, 4, 6, 8];

/// Simple struct for recording all of the interesting data points accumulated during a simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub label: String,
    pub num_simulations: u32,
    pub hands_per_simulation: u32,
    pub hands_played: u64,
    pub early_endings: u32,
    pub starting_bankroll: i64,
    /// Sum of the final bankrolls over every simulation.
    pub total_final_bankroll: i64,
    pub stats: Statistics,
}

impl SimulationSummary {
    fn new(label: String, hands_per_simulation: u32, starting_bankroll: i64) -> Self {
        SimulationSummary {
            label,
            num_simulations: 0,
            hands_per_simulation,
            hands_played: 0,
            early_endings: 0,
            starting_bankroll,
            total_final_bankroll: 0,
            stats: Statistics::new(),
        }
    }

    pub fn average_final_bankroll(&self) -> f64 {
        if self.num_simulations == 0 {
            return self.starting_bankroll as f64;
        }
        (self.total_final_bankroll as f64) / (self.num_simulations as f64)
    }

    pub fn roi(&self) -> f64 {
        self.stats.roi()
    }

    /// Average profit per hand played.
    pub fn average_winnings_per_hand(&self) -> f64 {
        if self.hands_played == 0 {
            return 0.0;
        }
        (self.stats.net_profit() as f64) / (self.hands_played as f64)
    }
}

impl Display for SimulationSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const WIDTH: usize = 80;
        const TEXT_WIDTH: usize = "average winnings per hand".len() + 20;
        const NUM_WIDTH: usize = WIDTH - TEXT_WIDTH;
        let stats = &self.stats;
        let total = stats.games_played.max(1) as f64;
        let body = format!(
            "{}{}\n\
        {:<TEXT_WIDTH$}{:>NUM_WIDTH$}\n\
        {:<TEXT_WIDTH$}{:>NUM_WIDTH$}\n\
        {:<TEXT_WIDTH$}{:>NUM_WIDTH$}\n\
        {:<TEXT_WIDTH$}{:>NUM_WIDTH$}\n\
        {:<TEXT_WIDTH$}{:>NUM_WIDTH$}\n\
        {:<TEXT_WIDTH$}{:>NUM_WIDTH$}\n\
        {:<TEXT_WIDTH$}{:>NUM_WIDTH$}\n\
        {:<TEXT_WIDTH$}{:>NUM_WIDTH$}\n\
        {:<TEXT_WIDTH$}{:>NUM_WIDTH$.2}\n\
        {:<TEXT_WIDTH$}{:>NUM_WIDTH$.2}\n\
        {:<TEXT_WIDTH$}{:>NUM_WIDTH$.2}\n\
        {:<TEXT_WIDTH$}{:>NUM_WIDTH$.2}\n\
        {:<TEXT_WIDTH$}{:>NUM_WIDTH$.2}\n\
        {:<TEXT_WIDTH$}{:>NUM_WIDTH$.2}\n",
            "strategy: ",
            self.label,
            "hands won",
            stats.wins,
            "hands pushed",
            stats.pushes,
            "hands lost",
            stats.losses,
            "number of player blackjacks",
            stats.blackjacks,
            "number of early endings",
            self.early_endings,
            "total hands played",
            stats.games_played,
            "total wagered",
            stats.total_wagered,
            "net winnings",
            stats.net_profit(),
            "win %",
            (stats.wins as f64) / total * 100.0,
            "push %",
            (stats.pushes as f64) / total * 100.0,
            "loss %",
            (stats.losses as f64) / total * 100.0,
            "average winnings per hand",
            self.average_winnings_per_hand(),
            "average final bankroll",
            self.average_final_bankroll(),
            "roi %",
            self.roi(),
        );
        write!(f, "{}", body)
    }
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("game error: {0}")]
    GameError(#[from] BlackjackGameError),
    #[error("write error: {0}")]
    WriteError(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("no simulations have been added")]
    NoSimulations,
    #[error("simulation thread for `{0}` panicked")]
    ThreadPanicked(String),
}

pub trait BlackjackSimulation: Send {
    /// Required method, the method that will be called to run all simulations.
    fn run(&mut self) -> Result<(), BlackjackGameError>;
    /// Required method, the method that will be called to run a single simulation.
    fn run_single_simulation(&mut self) -> Result<(), BlackjackGameError>;
    /// Required method, writes the stats recorded so far.
    fn display_stats(&self, writer: &mut dyn Write) -> std::io::Result<()>;
    /// Required method, the method that will reset the simulation
    fn reset(&mut self);
    /// Required method, the method for producing output statistics/data recorded during the simulation
    fn summary(&self) -> SimulationSummary;
    fn label(&self) -> String;
}

/// Struct for running a number of simulations for a specific strategy.
/// Every simulation starts from the configured bankroll and a freshly shuffled shoe, and the results
/// of all of them are accumulated into one `SimulationSummary`.
pub struct BlackjackSimulator<S: Strategy> {
    game: BlackjackGameSim<S>,
    config: BlackjackSimulatorConfig,
    summary: SimulationSummary,
}

impl<S: Strategy> BlackjackSimulator<S> {
    pub fn new(strategy: S, config: BlackjackSimulatorConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let shoe = match config.seed {
            Some(seed) => Shoe::with_seed(config.num_decks, seed)?,
            None => Shoe::new(config.num_decks)?,
        };
        let player = Player::new(config.player_starting_balance, strategy);
        let table = BlackjackTable::with_rules(shoe, player, config.base_bet, config.table_rules());
        let game = BlackjackGameSim::new(table, config.hands_per_simulation);
        let summary = SimulationSummary::new(
            game.label(),
            config.hands_per_simulation,
            config.player_starting_balance,
        );
        Ok(Self {
            game,
            config,
            summary,
        })
    }

    pub fn game(&self) -> &BlackjackGameSim<S> {
        &self.game
    }

    fn record_simulation(&mut self) {
        self.summary.num_simulations += 1;
        self.summary.hands_played += u64::from(self.game.hands_played);
        self.summary.total_final_bankroll += self.game.final_bankroll();
        if self.game.ended_early {
            self.summary.early_endings += 1;
        }
        self.summary.stats.merge(&self.game.stats);
    }
}

impl<S: Strategy> BlackjackSimulation for BlackjackSimulator<S> {
    /// Runs every configured simulation, resetting the bankroll in between.
    fn run(&mut self) -> Result<(), BlackjackGameError> {
        for i in 0..self.config.num_simulations {
            self.game.run()?;
            self.record_simulation();
            if !self.config.silent {
                let mut stdout = std::io::stdout();
                // Console output is best effort
                let _ = writeln!(stdout, "simulation #{}", i + 1);
                let _ = self.game.display_stats(&mut stdout);
            }
            debug!(
                "{}: simulation {} of {} done",
                self.summary.label,
                i + 1,
                self.config.num_simulations
            );

            self.game.reset(self.config.player_starting_balance);
        }
        Ok(())
    }

    /// Runs a single simulation. The game is not reset afterwards.
    fn run_single_simulation(&mut self) -> Result<(), BlackjackGameError> {
        self.game.run()?;
        self.record_simulation();
        Ok(())
    }

    fn display_stats(&self, writer: &mut dyn Write) -> std::io::Result<()> {
        const WIDTH: usize = 80;
        writeln!(writer, "{}", "-".repeat(WIDTH))?;
        writeln!(
            writer,
            "{:-^WIDTH$}",
            format!("running {} simulations", self.config.num_simulations)
        )?;
        write!(writer, "{}", self.summary)?;
        writeln!(writer, "{}", "-".repeat(WIDTH))
    }

    /// Clears the accumulated results and starts the game over.
    fn reset(&mut self) {
        self.game.reset(self.config.player_starting_balance);
        self.summary = SimulationSummary::new(
            self.game.label(),
            self.config.hands_per_simulation,
            self.config.player_starting_balance,
        );
    }

    fn summary(&self) -> SimulationSummary {
        self.summary.clone()
    }

    fn label(&self) -> String {
        self.game.label()
    }
}

/// This struct is for testing multiple strategies under one configuration. Each strategy runs on its own thread;
/// the summaries are collected and returned in order of decreasing ROI.
pub struct MulStrategyBlackjackSimulator {
    simulations: Vec<Box<dyn BlackjackSimulation>>,
    pub config: BlackjackSimulatorConfig,
}

impl MulStrategyBlackjackSimulator {
    /// Method that returns a new `MulStrategyBlackjackSimulatorBuilder` object.
    pub fn new(config: BlackjackSimulatorConfig) -> MulStrategyBlackjackSimulatorBuilder {
        MulStrategyBlackjackSimulatorBuilder {
            strategies: vec![],
            config,
        }
    }

    /// Runs every simulation from a clean state and returns their summaries sorted by ROI, best first.
    pub fn run(&mut self) -> Result<Vec<SimulationSummary>, SimulationError> {
        if self.simulations.is_empty() {
            return Err(SimulationError::NoSimulations);
        }
        info!(
            "comparing {} strategies over {} x {} hands",
            self.simulations.len(),
            self.config.num_simulations,
            self.config.hands_per_simulation
        );

        let (sender, receiver) = mpsc::channel::<(usize, SimulationSummary)>();

        thread::scope(|scope| -> Result<(), SimulationError> {
            let mut handles = vec![];
            for (id, simulation) in self.simulations.iter_mut().enumerate() {
                let sender = sender.clone();
                let label = simulation.label();
                let handle = scope.spawn(move || -> Result<(), BlackjackGameError> {
                    simulation.reset();
                    simulation.run()?;
                    // The receiver outlives every worker
                    let _ = sender.send((id, simulation.summary()));
                    Ok(())
                });
                handles.push((label, handle));
            }

            for (label, handle) in handles {
                match handle.join() {
                    Ok(result) => result?,
                    Err(_) => return Err(SimulationError::ThreadPanicked(label)),
                }
            }
            Ok(())
        })?;
        drop(sender);

        let mut summaries: Vec<(usize, SimulationSummary)> = receiver.iter().collect();
        summaries.sort_by_key(|(id, _)| *id);
        let mut summaries: Vec<SimulationSummary> =
            summaries.into_iter().map(|(_, summary)| summary).collect();
        summaries.sort_by(|a, b| b.roi().total_cmp(&a.roi()));
        Ok(summaries)
    }

    /// Runs the simulations and writes the summaries to `writer`, as text or as JSON.
    pub fn run_and_write(
        &mut self,
        writer: &mut impl Write,
        as_json: bool,
    ) -> Result<Vec<SimulationSummary>, SimulationError> {
        let summaries = self.run()?;
        if as_json {
            write::write_summaries_json(&summaries, writer)?;
        } else {
            write::write_summaries(&summaries, writer)?;
            write::write_comparison(&summaries, writer)?;
        }
        Ok(summaries)
    }

    /// Adds a simulation for `strategy` using the simulator's configuration.
    pub fn add_simulation(&mut self, strategy: Box<dyn Strategy>) -> Result<(), SimulationError> {
        let simulation = BlackjackSimulator::new(strategy, self.config)?;
        self.simulations.push(Box::new(simulation));
        Ok(())
    }

    pub fn simulations(&self) -> &[Box<dyn BlackjackSimulation>] {
        &self.simulations
    }
}

/// Struct for building a `MulStrategyBlackjackSimulator` object
pub struct MulStrategyBlackjackSimulatorBuilder {
    strategies: Vec<Box<dyn Strategy>>,
    config: BlackjackSimulatorConfig,
}

impl MulStrategyBlackjackSimulatorBuilder {
    /// Method for adding a new simulation, the only required input is a struct that implements the `Strategy` trait,
    /// the rest of the configuration is taken from the `BlackjackSimulatorConfig` passed during object creation.
    pub fn simulation<S: Strategy + 'static>(&mut self, strategy: S) -> &mut Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Adds one simulation per strategy kind.
    pub fn simulations<I: IntoIterator<Item = StrategyKind>>(&mut self, kinds: I) -> &mut Self {
        for kind in kinds {
            self.strategies.push(kind.build());
        }
        self
    }

    /// Method that builds a `MulStrategyBlackjackSimulator` object, fails if the configuration is invalid.
    pub fn build(&mut self) -> Result<MulStrategyBlackjackSimulator, SimulationError> {
        let mut simulator = MulStrategyBlackjackSimulator {
            simulations: vec![],
            config: self.config,
        };
        self.config.validate()?;
        for strategy in self.strategies.drain(..) {
            simulator.add_simulation(strategy)?;
        }
        Ok(simulator)
    }
}

/// Struct for configuring a `BlackjackSimulator`. Every field is optional when deserialized from JSON.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlackjackSimulatorConfig {
    pub player_starting_balance: i64,
    pub num_simulations: u32,
    pub num_decks: usize,
    pub base_bet: u32,
    pub hands_per_simulation: u32,
    pub reshuffle_threshold: f32,
    pub silent: bool,
    pub surrender: bool,
    pub insurance: bool,
    pub seed: Option<u64>,
}

impl BlackjackSimulatorConfig {
    /// Associated method for returning a new `BlackjackSimulatorConfigBuilder` object. Allows customization of the simulation
    /// such as the players starting balance, the number of simulations run, the base bet per hand, and how many decks are used.
    pub fn new() -> BlackjackSimulatorConfigBuilder {
        BlackjackSimulatorConfigBuilder::default()
    }

    /// Checks the values a simulation cannot run with.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if !ALLOWED_DECK_COUNTS.contains(&self.num_decks) {
            return Err(SimulationError::InvalidConfig(format!(
                "number of decks must be one of {:?}, got {}",
                ALLOWED_DECK_COUNTS, self.num_decks
            )));
        }
        if self.base_bet == 0 {
            return Err(SimulationError::InvalidConfig(
                "base bet must be positive".to_string(),
            ));
        }
        if self.player_starting_balance < 0 {
            return Err(SimulationError::InvalidConfig(
                "starting balance cannot be negative".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.reshuffle_threshold) {
            return Err(SimulationError::InvalidConfig(format!(
                "reshuffle threshold must be in [0, 1), got {}",
                self.reshuffle_threshold
            )));
        }
        Ok(())
    }

    pub fn table_rules(&self) -> TableRules {
        TableRules {
            reshuffle_threshold: self.reshuffle_threshold,
            surrender: self.surrender,
            insurance: self.insurance,
        }
    }
}

impl Default for BlackjackSimulatorConfig {
    /// Returns the standard configuration.
    fn default() -> Self {
        BlackjackSimulatorConfig::new().build()
    }
}

/// Struct to implement builder pattern for `BlackjackSimulatorConfig`
#[derive(Debug, Clone, Copy, Default)]
pub struct BlackjackSimulatorConfigBuilder {
    player_starting_balance: Option<i64>,
    num_simulations: Option<u32>,
    num_decks: Option<usize>,
    base_bet: Option<u32>,
    hands_per_simulation: Option<u32>,
    reshuffle_threshold: Option<f32>,
    silent: Option<bool>,
    surrender: Option<bool>,
    insurance: Option<bool>,
    seed: Option<u64>,
}

impl BlackjackSimulatorConfigBuilder {
    /// Method for changing the starting balance of the player.
    pub fn player_starting_balance(&mut self, balance: i64) -> &mut Self {
        self.player_starting_balance = Some(balance);
        self
    }

    /// Method for setting the number of simulations run.
    pub fn num_simulations(&mut self, n: u32) -> &mut Self {
        self.num_simulations = Some(n);
        self
    }

    /// Method for choosing the number of decks used in the game
    pub fn num_decks(&mut self, decks: usize) -> &mut Self {
        self.num_decks = Some(decks);
        self
    }

    /// Method for setting the base bet, strategies may scale it up
    pub fn base_bet(&mut self, bet: u32) -> &mut Self {
        self.base_bet = Some(bet);
        self
    }

    /// Method for setting the maximum number of hands that will be played for each simulation
    pub fn hands_per_simulation(&mut self, hands: u32) -> &mut Self {
        self.hands_per_simulation = Some(hands);
        self
    }

    /// Method for setting the fraction of the shoe left at which it gets reshuffled
    pub fn reshuffle_threshold(&mut self, threshold: f32) -> &mut Self {
        self.reshuffle_threshold = Some(threshold);
        self
    }

    /// If set to false each simulation prints its own stats to stdout as it finishes.
    pub fn silent(&mut self, silent: bool) -> &mut Self {
        self.silent = Some(silent);
        self
    }

    /// Method for setting a flag that determines if the game allows surrender or not
    pub fn surrender(&mut self, surrender: bool) -> &mut Self {
        self.surrender = Some(surrender);
        self
    }

    /// Method for setting the flag that determines if insurance is offered when the dealer shows an ace.
    pub fn insurance(&mut self, insurance: bool) -> &mut Self {
        self.insurance = Some(insurance);
        self
    }

    /// Seeds the shoe so runs are reproducible.
    pub fn seed(&mut self, seed: u64) -> &mut Self {
        self.seed = Some(seed);
        self
    }

    /// Method for building a `BlackjackSimulatorConfig` object from the given `BlackjackSimulatorConfigBuilder` object.
    pub fn build(&mut self) -> BlackjackSimulatorConfig {
        BlackjackSimulatorConfig {
            player_starting_balance: self.player_starting_balance.unwrap_or(1000),
            num_simulations: self.num_simulations.unwrap_or(1),
            num_decks: self.num_decks.unwrap_or(6),
            base_bet: self.base_bet.unwrap_or(10),
            hands_per_simulation: self.hands_per_simulation.unwrap_or(500),
            reshuffle_threshold: self.reshuffle_threshold.unwrap_or(0.25),
            silent: self.silent.unwrap_or(true),
            surrender: self.surrender.unwrap_or(false),
            insurance: self.insurance.unwrap_or(false),
            seed: self.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BlackjackSimulatorConfig {
        BlackjackSimulatorConfig::new()
            .num_simulations(3)
            .hands_per_simulation(200)
            .seed(7)
            .build()
    }

    #[test]
    fn test_config_defaults() {
        let config = BlackjackSimulatorConfig::default();
        assert_eq!(config.player_starting_balance, 1000);
        assert_eq!(config.num_decks, 6);
        assert_eq!(config.base_bet, 10);
        assert_eq!(config.hands_per_simulation, 500);
        assert_eq!(config.reshuffle_threshold, 0.25);
        assert!(config.silent);
        assert!(!config.insurance);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: BlackjackSimulatorConfig =
            serde_json::from_str(r#"{"num_decks": 2, "base_bet": 25}"#).unwrap();
        assert_eq!(config.num_decks, 2);
        assert_eq!(config.base_bet, 25);
        assert_eq!(config.player_starting_balance, 1000);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let bad_decks = BlackjackSimulatorConfig::new().num_decks(3).build();
        assert!(matches!(
            BlackjackSimulator::new(BasicStrategy::new(), bad_decks),
            Err(SimulationError::InvalidConfig(_))
        ));
        let bad_bet = BlackjackSimulatorConfig::new().base_bet(0).build();
        assert!(bad_bet.validate().is_err());
        let bad_threshold = BlackjackSimulatorConfig::new().reshuffle_threshold(1.5).build();
        assert!(bad_threshold.validate().is_err());
    }

    #[test]
    fn simple_simulation_test() {
        let mut simulator = BlackjackSimulator::new(BasicStrategy::new(), config()).unwrap();
        simulator.run().unwrap();
        let summary = simulator.summary();
        assert_eq!(summary.num_simulations, 3);
        assert_eq!(summary.label, "Basic Strategy");
        assert_eq!(summary.hands_played, summary.stats.games_played);
        assert!(summary.hands_played <= 600);

        let mut out = Vec::new();
        simulator.display_stats(&mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("running 3 simulations"));

        simulator.reset();
        assert_eq!(simulator.summary().num_simulations, 0);
    }

    #[test]
    fn test_summary_shows_percentages() {
        let mut summary = SimulationSummary::new("Basic Strategy".to_string(), 4, 100);
        summary.stats.games_played = 4;
        summary.stats.wins = 3;
        summary.stats.losses = 1;
        let text = summary.to_string();
        let row = |label: &str| {
            text.lines()
                .find(|line| line.starts_with(label))
                .map(|line| line.split_whitespace().last().unwrap_or("").to_string())
        };
        assert_eq!(row("win %").as_deref(), Some("75.00"));
        assert_eq!(row("loss %").as_deref(), Some("25.00"));
        assert_eq!(row("push %").as_deref(), Some("0.00"));
    }

    #[test]
    fn test_seeded_simulations_repeat() {
        let run = || {
            let mut simulator = BlackjackSimulator::new(CardCountingStrategy::new(), config()).unwrap();
            simulator.run().unwrap();
            simulator.summary().stats
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn run_multiple_simulations() {
        let mut simulator = MulStrategyBlackjackSimulator::new(config())
            .simulations(StrategyKind::ALL)
            .build()
            .unwrap();
        assert_eq!(simulator.simulations().len(), 5);

        let summaries = simulator.run().unwrap();
        assert_eq!(summaries.len(), 5);
        for pair in summaries.windows(2) {
            assert!(pair[0].roi() >= pair[1].roi());
        }

        // Running again starts from scratch
        let again = simulator.run().unwrap();
        assert_eq!(again[0].num_simulations, 3);
    }

    #[test]
    fn test_empty_simulator_refuses_to_run() {
        let mut simulator = MulStrategyBlackjackSimulator::new(config()).build().unwrap();
        assert!(matches!(simulator.run(), Err(SimulationError::NoSimulations)));
    }
}
