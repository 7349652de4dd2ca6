use std::io::{self, Write};
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use fare_algo::{ObjectiveKind, SweepParameter};
use fare_io::SweepReport;
use fare_scenarios::{run_sweeps, ResolvedAnalysis};
use tabwriter::TabWriter;
use tracing::info;

use super::util::{emit_json, load_analysis};
use fare_cli::cli::OutputFormat;

/// Ad-hoc sweep given on the command line.
pub struct SweepRequest<'a> {
    pub mode: &'a str,
    pub parameter: &'a str,
    pub values: &'a [f64],
    pub objective: &'a str,
}

pub fn handle(spec: &Path, request: Option<SweepRequest<'_>>, format: OutputFormat) -> Result<()> {
    let analysis = load_analysis(spec)?;
    let reports = match request {
        Some(request) => vec![run_request(&analysis, &request)?],
        None => {
            if analysis.sweeps.is_empty() {
                bail!(
                    "'{}' declares no sweeps; pass --mode, --parameter and --values",
                    spec.display()
                );
            }
            run_sweeps(&analysis)?
        }
    };
    info!(sweeps = reports.len(), "sensitivity sweeps complete");

    match format {
        OutputFormat::Json => emit_json(&serde_json::to_value(&reports)?, None),
        OutputFormat::Table => print_sweep_table(&reports),
    }
}

fn run_request(analysis: &ResolvedAnalysis, request: &SweepRequest<'_>) -> Result<SweepReport> {
    let parameter: SweepParameter = request.parameter.parse()?;
    let objective: ObjectiveKind = request.objective.parse()?;
    let mode = analysis
        .mode(request.mode)
        .ok_or_else(|| anyhow!("mode '{}' is not in the analysis spec", request.mode))?;
    let points = analysis
        .optimizer
        .sweep_model(parameter, request.values, &mode.model()?, &mode.bounds, objective)
        .with_context(|| format!("sweeping {parameter} for '{}'", request.mode))?;
    Ok(SweepReport {
        mode: request.mode.to_string(),
        parameter,
        objective,
        points,
    })
}

fn print_sweep_table(reports: &[SweepReport]) -> Result<()> {
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "MODE\tPARAMETER\tOBJECTIVE\tVALUE\tPRICE\tOBJECTIVE VALUE\tDEMAND")?;
    for report in reports {
        for point in &report.points {
            writeln!(
                writer,
                "{}\t{}\t{}\t{}\t{:.2}\t{:.2}\t{:.1}",
                report.mode,
                report.parameter,
                report.objective.code(),
                point.value,
                point.result.optimal_price,
                point.result.objective_value,
                point.result.demand_at_optimum
            )?;
        }
    }
    writer.flush()?;
    Ok(())
}
