use crate::SimulationSummary;
use serde::Serialize;
use std::io::Write;

const WIDTH: usize = 80;

fn format_summaries(summaries: &[SimulationSummary]) -> Vec<String> {
    summaries
        .iter()
        .enumerate()
        .map(|(i, summary)| {
            let sim_num = format!("simulation #{}", i + 1);
            let header = format!("{:-^WIDTH$}\n", sim_num);
            format!("{}{}{}\n", header, summary, "-".repeat(WIDTH))
        })
        .collect()
}

/// Writes every summary, one formatted block each, in the order given.
pub fn write_summaries(
    summaries: &[SimulationSummary],
    writer: &mut impl Write,
) -> std::io::Result<()> {
    for formatted in format_summaries(summaries) {
        writer.write_all(formatted.as_bytes())?;
    }
    Ok(())
}

/// Writes a one line per strategy comparison table followed by the best strategy.
/// `summaries` is expected to be sorted best first.
pub fn write_comparison(
    summaries: &[SimulationSummary],
    writer: &mut impl Write,
) -> std::io::Result<()> {
    writeln!(writer, "{:=^WIDTH$}", " strategy comparison ")?;
    writeln!(
        writer,
        "{:<24}{:>16}{:>14}{:>12}{:>14}",
        "Strategy", "Final $", "Profit", "ROI", "Winrate"
    )?;
    writeln!(writer, "{}", "-".repeat(WIDTH))?;
    for summary in summaries {
        writeln!(
            writer,
            "{:<24}{:>16.2}{:>14}{:>11.2}%{:>13.2}%",
            summary.label,
            summary.average_final_bankroll(),
            summary.stats.net_profit(),
            summary.roi(),
            summary.stats.winrate(),
        )?;
    }
    writeln!(writer, "{}", "=".repeat(WIDTH))?;

    if let Some(best) = summaries.first() {
        writeln!(
            writer,
            "Best Strategy: {} with {:.2}% ROI",
            best.label,
            best.roi()
        )?;
    }
    Ok(())
}

#[derive(Serialize)]
struct SummaryJson<'a> {
    #[serde(flatten)]
    summary: &'a SimulationSummary,
    winrate: f64,
    roi: f64,
    net_profit: i64,
    average_final_bankroll: f64,
}

/// Writes the summaries as a pretty printed JSON array, with the derived figures included.
pub fn write_summaries_json(
    summaries: &[SimulationSummary],
    writer: &mut impl Write,
) -> serde_json::Result<()> {
    let rows: Vec<SummaryJson> = summaries
        .iter()
        .map(|summary| SummaryJson {
            summary,
            winrate: summary.stats.winrate(),
            roi: summary.roi(),
            net_profit: summary.stats.net_profit(),
            average_final_bankroll: summary.average_final_bankroll(),
        })
        .collect();
    serde_json::to_writer_pretty(&mut *writer, &rows)?;
    writeln!(writer).map_err(serde_json::Error::io)
}
