use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use fare_algo::{rank, results_by_mode, ModeRanking};
use fare_scenarios::optimize_plans;
use tabwriter::TabWriter;
use tracing::info;

use super::util::{emit_json, load_analysis};
use fare_cli::cli::OutputFormat;

pub fn handle(spec: &Path, format: OutputFormat) -> Result<()> {
    let analysis = load_analysis(spec)?;
    let plans = optimize_plans(&analysis)?;
    let rankings = rank(&analysis.profiles(), &results_by_mode(&plans), &analysis.criteria)
        .context("ranking modes")?;
    if let Some(best) = rankings.first() {
        info!(mode = %best.mode, score = best.weighted_score, "top ranked mode");
    }

    match format {
        OutputFormat::Json => emit_json(&serde_json::to_value(&rankings)?, None),
        OutputFormat::Table => print_ranking_table(&rankings),
    }
}

fn print_ranking_table(rankings: &[ModeRanking]) -> Result<()> {
    let mut writer = TabWriter::new(io::stdout());
    let metrics: Vec<_> = rankings
        .first()
        .map(|r| r.per_criterion_normalized_score.keys().copied().collect())
        .unwrap_or_default();

    write!(writer, "RANK\tMODE\tSCORE")?;
    for metric in &metrics {
        write!(writer, "\t{}", metric.to_string().to_uppercase())?;
    }
    writeln!(writer)?;

    for ranking in rankings {
        write!(
            writer,
            "{}\t{}\t{:.3}",
            ranking.rank, ranking.mode, ranking.weighted_score
        )?;
        for metric in &metrics {
            let score = ranking
                .per_criterion_normalized_score
                .get(metric)
                .copied()
                .unwrap_or(0.0);
            write!(writer, "\t{score:.3}")?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}
