use blackjack_sim::prelude::*;

/// Plays rounds one decision at a time with a card counting player and prints the table after every step.
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let numb_rounds_result = if let Some(n) = std::env::args().nth(1) {
        n.parse::<u32>()
    } else {
        eprintln!("usage: play_n_rounds ROUNDS");
        std::process::exit(1);
    };

    let mut numb_rounds = match numb_rounds_result {
        Ok(n) => n,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    const BASE_BET: u32 = 5;
    const STARTING_BALANCE: i64 = 500;
    let shoe = match Shoe::new(6) {
        Ok(shoe) => shoe,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };
    let player = Player::new(STARTING_BALANCE, CardCountingStrategy::new());
    let mut table = BlackjackTable::new(shoe, player, BASE_BET);
    let mut stats = Statistics::new();

    while numb_rounds > 0 && table.player().can_cover(BASE_BET) {
        match table.start_round() {
            Ok(_) => {}
            Err(BlackjackGameError::ShoeExhausted) => {
                eprintln!("shoe ran out, round voided");
                continue;
            }
            Err(e) => {
                eprintln!("error: {e}");
                return;
            }
        }

        println!("stake: {}", table.stake());
        println!("{}", table.player());
        println!();

        while table.state() == RoundState::PlayerTurn {
            println!("dealers_hand: {}", table.dealer().show_hand(true));
            println!();

            let upcard = match table.dealer().upcard() {
                Some(card) => *card,
                None => break,
            };
            let options = table.playing_options();
            println!("options: {:?}", options);

            let decision = table
                .player()
                .strategy()
                .decide(table.player().hand(), &upcard, options);
            println!("chosen option: {decision}");
            println!();

            let result = match decision {
                Action::Hit => table.hit().map(|_| ()),
                Action::DoubleDown => table.double_down().map(|_| ()),
                Action::Surrender => table.surrender().map(|_| ()),
                // Splits are played as a stand
                Action::Split | Action::Stand | Action::Insurance => table.stand().map(|_| ()),
            };
            if let Err(e) = result {
                eprintln!("error: {e}");
                return;
            }

            println!("{}", table.player());
            println!();
        }

        println!("dealers_hand: {}", table.dealer().show_hand(false));
        if let Some(report) = table.last_round() {
            println!(
                "result: {} (stake {}, payout {}, net {})",
                report.outcome,
                report.stake,
                report.payout,
                report.net()
            );
            stats.record(&GameRecord::from(report));
        }
        println!("running count: {}", table.player().strategy().running_count());
        println!();

        numb_rounds -= 1;
    }

    let width = "number of player blackjacks:".len() + 20;
    let numeric_display_width = 80 - width;
    println!("{}", "-".repeat(80));
    println!("{:-^80}", "stats");
    let result_str = format!(
        "{:<width$}{:>numeric_display_width$}\n{:<width$}{:>numeric_display_width$}\n{:<width$}{:>numeric_display_width$}\n{:<width$}{:>numeric_display_width$}",
        "total wins:",
        stats.wins,
        "total pushes:",
        stats.pushes,
        "total losses:",
        stats.losses,
        "total winnings:",
        stats.net_profit()
    );
    println!("{result_str}");
    println!(
        "{:<width$}{:>numeric_display_width$}",
        "final balance",
        table.player().bankroll()
    );
    println!(
        "{:<width$}{:>numeric_display_width$}",
        "number of player blackjacks:", stats.blackjacks,
    );
    println!("{}", "-".repeat(80));
}
