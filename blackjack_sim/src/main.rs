use blackjack_sim::prelude::*;
use blackjack_sim::{write, ALLOWED_DECK_COUNTS};
use clap::{CommandFactory, Parser};
use std::io::Write;

#[derive(Parser)]
#[command(name = "blackjack_sim", about = "Simulate blackjack strategies over many hands")]
struct Cli {
    /// Number of hands to play per simulation
    #[arg(long, value_name = "N")]
    simulate: Option<u32>,

    /// Strategy to simulate
    #[arg(long, default_value_t = StrategyKind::Basic)]
    strategy: StrategyKind,

    /// Run every strategy under the same settings and compare them
    #[arg(long)]
    compare_strategies: bool,

    /// Starting bankroll
    #[arg(long, default_value_t = 1000)]
    bankroll: i64,

    /// Base bet per hand
    #[arg(long, default_value_t = 10)]
    bet: u32,

    /// Number of decks in the shoe (1, 2, 4, 6 or 8)
    #[arg(long, default_value_t = 6, value_parser = parse_decks)]
    decks: usize,

    /// Number of repeated simulations, each starting from a fresh bankroll
    #[arg(long, default_value_t = 1)]
    simulations: u32,

    /// Seed for the shoe, makes runs reproducible
    #[arg(long)]
    seed: Option<u64>,

    /// Write the results as JSON
    #[arg(long)]
    json: bool,

    /// Offer insurance when the dealer shows an ace
    #[arg(long)]
    insurance: bool,

    /// Allow late surrender
    #[arg(long)]
    surrender: bool,
}

impl Cli {
    fn config(&self) -> BlackjackSimulatorConfig {
        let mut builder = BlackjackSimulatorConfig::new();
        builder
            .player_starting_balance(self.bankroll)
            .base_bet(self.bet)
            .num_decks(self.decks)
            .num_simulations(self.simulations)
            .insurance(self.insurance)
            .surrender(self.surrender);
        if let Some(hands) = self.simulate {
            builder.hands_per_simulation(hands);
        }
        if let Some(seed) = self.seed {
            builder.seed(seed);
        }
        builder.build()
    }
}

fn parse_decks(s: &str) -> Result<usize, String> {
    let decks: usize = s.parse().map_err(|e| format!("{e}"))?;
    if ALLOWED_DECK_COUNTS.contains(&decks) {
        Ok(decks)
    } else {
        Err(format!("must be one of {:?}", ALLOWED_DECK_COUNTS))
    }
}

fn simulate(
    kind: StrategyKind,
    config: BlackjackSimulatorConfig,
    as_json: bool,
    out: &mut impl Write,
) -> Result<(), SimulationError> {
    let mut simulator = BlackjackSimulator::new(kind.build(), config)?;
    simulator.run()?;
    let summary = simulator.summary();

    if as_json {
        write::write_summaries_json(&[summary], out)?;
        return Ok(());
    }

    simulator.display_stats(out)?;
    let final_bankroll = summary.average_final_bankroll();
    let net = final_bankroll - (config.player_starting_balance as f64);
    writeln!(out, "{:<30}{:>50}", "initial bankroll:", config.player_starting_balance)?;
    writeln!(out, "{:<30}{:>50.2}", "final bankroll:", final_bankroll)?;
    writeln!(out, "{:<30}{:>50.2}", "net:", net)?;
    writeln!(out, "{:<30}{:>49.2}%", "roi:", summary.roi())?;
    if summary.early_endings > 0 {
        writeln!(
            out,
            "bankrupt in {} of {} simulations",
            summary.early_endings, summary.num_simulations
        )?;
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), SimulationError> {
    let config = cli.config();
    let mut stdout = std::io::stdout().lock();

    if cli.compare_strategies {
        MulStrategyBlackjackSimulator::new(config)
            .simulations(StrategyKind::ALL)
            .build()?
            .run_and_write(&mut stdout, cli.json)?;
        return Ok(());
    }

    if cli.simulate.is_some() {
        return simulate(cli.strategy, config, cli.json, &mut stdout);
    }

    Cli::command().print_help()?;
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
