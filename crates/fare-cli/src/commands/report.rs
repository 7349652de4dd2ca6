use std::path::Path;

use anyhow::Result;
use fare_io::{
    aggregate_income_profiles, default_policies, evaluate_subsidy_policies, load_survey,
    optimize_income_groups, write_json, write_markdown, EquityReport, ProfileAssumptions,
    GROUP_BOUND_MULTIPLIERS,
};
use fare_scenarios::run_analysis;
use tracing::{info, warn};

use super::util::load_analysis;

pub fn handle(spec: &Path, out: &Path, json: Option<&Path>, survey: Option<&Path>) -> Result<()> {
    let analysis = load_analysis(spec)?;
    let mut report = run_analysis(&analysis)?.into_report(&analysis);

    if let Some(path) = survey {
        let survey = load_survey(path)?;
        if survey.diagnostics.has_issues() {
            warn!("{}", survey.diagnostics.summary());
        }
        let equity = EquityReport::from_records(&survey.records)?;
        let policies = evaluate_subsidy_policies(&survey.records, &default_policies())?;

        // income groups inherit the elasticity declared for their mode
        let assumptions = ProfileAssumptions {
            elasticity_overrides: analysis
                .modes
                .iter()
                .map(|m| (m.profile.name().to_string(), m.profile.price_elasticity()))
                .collect(),
            ..ProfileAssumptions::default()
        };
        let groups = aggregate_income_profiles(&survey.records, &assumptions)?;
        let (lower, upper) = GROUP_BOUND_MULTIPLIERS;
        let income_plans = optimize_income_groups(&analysis.optimizer, &groups, lower, upper)?;

        report = report
            .with_equity(equity, policies)
            .with_income_plans(income_plans)
            .with_diagnostics(survey.diagnostics);
    }

    for (mode, result) in report.flagged_results() {
        let objective = result.objective.code();
        if !result.converged {
            warn!(mode, objective, "refinement did not converge; best grid fare used");
        }
        if result.is_zero_ridership() {
            warn!(mode, objective, "optimum has zero ridership");
        }
    }

    write_markdown(&report, out)?;
    info!("wrote report to {}", out.display());
    if let Some(path) = json {
        write_json(&report, path)?;
        info!("wrote JSON report to {}", path.display());
    }
    Ok(())
}
