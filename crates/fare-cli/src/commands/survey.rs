use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use fare_algo::{FareOptimizer, ObjectiveKind};
use fare_core::ModeEconomicProfile;
use fare_io::{
    aggregate_income_profiles, aggregate_profiles, default_policies, evaluate_subsidy_policies,
    load_survey, optimize_income_groups, EquityReport, IncomeGroupPlan, PolicyOutcome,
    ProfileAssumptions, GROUP_BOUND_MULTIPLIERS,
};
use fare_scenarios::{write_spec_to_path, AnalysisSpec};
use serde_json::json;
use tabwriter::TabWriter;
use tracing::{info, warn};

use super::util::emit_json;
use fare_cli::cli::OutputFormat;

/// Survey command settings.
pub struct SurveyOptions<'a> {
    pub elasticity: f64,
    pub cost_ratio: f64,
    pub by_income: bool,
    pub income_elasticity: &'a [(String, f64)],
    pub emit_spec: Option<&'a Path>,
}

pub fn handle(csv: &Path, options: &SurveyOptions<'_>, format: OutputFormat) -> Result<()> {
    let survey = load_survey(csv)?;
    if survey.diagnostics.has_issues() {
        warn!("{}", survey.diagnostics.summary());
    }
    info!(
        records = survey.records.len(),
        modes = survey.modes().len(),
        "loaded survey"
    );

    let assumptions = ProfileAssumptions {
        default_elasticity: options.elasticity,
        income_elasticity: options.income_elasticity.iter().cloned().collect(),
        cost_ratio: options.cost_ratio,
        ..ProfileAssumptions::default()
    };
    let profiles = aggregate_profiles(&survey.records, &assumptions)?;
    let equity = EquityReport::from_records(&survey.records)?;
    let policies = evaluate_subsidy_policies(&survey.records, &default_policies())?;
    let income_plans = if options.by_income {
        let groups = aggregate_income_profiles(&survey.records, &assumptions)?;
        let (lower, upper) = GROUP_BOUND_MULTIPLIERS;
        optimize_income_groups(&FareOptimizer::new(), &groups, lower, upper)?
    } else {
        Vec::new()
    };

    if let Some(path) = options.emit_spec {
        let spec = AnalysisSpec::from_profiles("Survey-derived fare analysis", &profiles);
        write_spec_to_path(&spec, path)?;
        info!("wrote analysis spec to {}", path.display());
    }

    match format {
        OutputFormat::Json => emit_json(
            &json!({
                "profiles": profiles,
                "equity": equity,
                "policies": policies,
                "income_plans": income_plans,
                "skipped_rows": survey.diagnostics.issues.len(),
            }),
            None,
        ),
        OutputFormat::Table => print_tables(&profiles, &equity, &policies, &income_plans),
    }
}

fn print_tables(
    profiles: &[ModeEconomicProfile],
    equity: &EquityReport,
    policies: &[PolicyOutcome],
    income_plans: &[IncomeGroupPlan],
) -> Result<()> {
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "MODE\tMEAN FARE\tTRIPS\tELASTICITY\tUNIT COST")?;
    for profile in profiles {
        writeln!(
            writer,
            "{}\t{:.2}\t{}\t{}\t{:.2}",
            profile.name(),
            profile.base_price(),
            profile.base_demand(),
            profile.price_elasticity(),
            profile.unit_cost()
        )?;
    }
    writeln!(writer)?;

    writeln!(writer, "INCOME\tTRIPS\tMEAN RATIO\tMEDIAN RATIO\tUNAFFORDABLE %")?;
    for (group, summary) in &equity.affordability_by_income {
        writeln!(
            writer,
            "{}\t{}\t{:.2}\t{:.2}\t{:.1}",
            group,
            summary.trips,
            summary.mean_ratio,
            summary.median,
            summary.unaffordable_percentage
        )?;
    }
    writeln!(writer)?;

    writeln!(writer, "POLICY\tSUBSIDY COST\tTRIPS MADE AFFORDABLE\tPER UNIT COST")?;
    for outcome in policies {
        writeln!(
            writer,
            "{}\t{:.2}\t{}\t{:.4}",
            outcome.policy,
            outcome.total_subsidy_cost,
            outcome.accessibility_improvement,
            outcome.cost_effectiveness
        )?;
    }

    if !income_plans.is_empty() {
        writeln!(writer)?;
        write!(writer, "MODE\tINCOME\tMEAN FARE\tTRIPS\tELASTICITY")?;
        for kind in ObjectiveKind::ALL {
            write!(writer, "\t{}", kind.code())?;
        }
        writeln!(writer)?;
        for group in income_plans {
            write!(
                writer,
                "{}\t{}\t{:.2}\t{}\t{}",
                group.mode,
                group.income_bracket,
                group.profile.base_price(),
                group.profile.base_demand(),
                group.profile.price_elasticity()
            )?;
            for kind in ObjectiveKind::ALL {
                match group.plan.results.get(&kind) {
                    Some(result) => write!(writer, "\t{:.2}", result.optimal_price)?,
                    None => write!(writer, "\t-")?,
                }
            }
            writeln!(writer)?;
        }
    }
    writer.flush()?;
    Ok(())
}
