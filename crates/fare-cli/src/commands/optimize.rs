use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use fare_algo::ModePlan;
use fare_scenarios::optimize_plans;
use tabwriter::TabWriter;
use tracing::info;

use super::util::{emit_json, load_analysis};
use fare_cli::cli::OutputFormat;

pub fn handle(spec: &Path, format: OutputFormat, out: Option<&Path>) -> Result<()> {
    let analysis = load_analysis(spec)?;
    info!(modes = analysis.modes.len(), "optimizing fares for '{}'", analysis.title);
    let plans = optimize_plans(&analysis)?;

    if format == OutputFormat::Json || out.is_some() {
        emit_json(&serde_json::to_value(&plans)?, out)?;
    }
    if format == OutputFormat::Table {
        print_plan_table(&plans)?;
    }
    Ok(())
}

pub fn print_plan_table(plans: &[ModePlan]) -> Result<()> {
    let mut writer = TabWriter::new(io::stdout());
    writeln!(
        writer,
        "MODE\tOBJECTIVE\tPRICE\tVALUE\tDEMAND\tREVENUE\tCOST\tPROFIT\tCONVERGED"
    )?;
    for plan in plans {
        for (kind, result) in &plan.results {
            writeln!(
                writer,
                "{}\t{}\t{:.2}\t{:.2}\t{:.1}\t{:.2}\t{:.2}\t{:.2}\t{}",
                plan.mode,
                kind.code(),
                result.optimal_price,
                result.objective_value,
                result.demand_at_optimum,
                result.revenue,
                result.cost,
                result.profit,
                if result.converged { "yes" } else { "no" }
            )?;
        }
    }
    writer.flush()?;
    Ok(())
}
