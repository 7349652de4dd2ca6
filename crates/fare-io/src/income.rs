//! Fare optimization per (mode, income bracket) group.
//!
//! Each group seen in the survey gets its own demand curve: the group's mean
//! fare and trip count, with the elasticity resolved by
//! [`ProfileAssumptions::elasticity_for_group`]. All five objectives are then
//! optimized per group, so fares for low-income riders of a mode can be read
//! next to those for high-income riders of the same mode.

use anyhow::{Context, Result};
use fare_algo::{FareOptimizer, ModeJob, ModePlan};
use fare_core::{FareModel, ModeEconomicProfile, PriceBounds};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::survey::{
    fare_totals, survey_frame, ProfileAssumptions, SurveyRecord, INCOME_COLUMN, MODE_COLUMN,
};

/// Fare bounds around a group's mean fare when none are given:
/// half to double, as for survey-derived mode specs.
pub const GROUP_BOUND_MULTIPLIERS: (f64, f64) = (0.5, 2.0);

/// Demand profile of one income bracket on one mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeGroupProfile {
    pub mode: String,
    pub income_bracket: String,
    /// Named `"{mode} / {income_bracket}"`
    pub profile: ModeEconomicProfile,
}

/// One profile per (mode, income bracket) pair, in order of first appearance.
///
/// Records without an income bracket are left out. Base price, base demand
/// and unit cost are derived as in [`crate::survey::aggregate_profiles`].
pub fn aggregate_income_profiles(
    records: &[SurveyRecord],
    assumptions: &ProfileAssumptions,
) -> Result<Vec<IncomeGroupProfile>> {
    let totals = fare_totals(&survey_frame(records)?, &[MODE_COLUMN, INCOME_COLUMN])?;
    let modes = totals.column(MODE_COLUMN)?.utf8()?;
    let brackets = totals.column(INCOME_COLUMN)?.utf8()?;
    let mean_fare = totals.column("mean_fare")?.f64()?;
    let trips = totals.column("trips")?.i64()?;

    let mut groups = Vec::with_capacity(totals.height());
    for idx in 0..totals.height() {
        let (Some(mode), Some(bracket), Some(fare), Some(trips)) = (
            modes.get(idx),
            brackets.get(idx),
            mean_fare.get(idx),
            trips.get(idx),
        ) else {
            continue;
        };
        let profile = ModeEconomicProfile::new(
            format!("{mode} / {bracket}"),
            fare,
            trips as f64,
            assumptions.elasticity_for_group(mode, bracket),
            assumptions.cost_ratio * fare,
        )
        .with_context(|| format!("profiling {bracket} income riders of '{mode}'"))?;
        groups.push(IncomeGroupProfile {
            mode: mode.to_string(),
            income_bracket: bracket.to_string(),
            profile,
        });
    }
    debug!(groups = groups.len(), "income groups profiled");
    Ok(groups)
}

/// All five optimal fares for one income group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeGroupPlan {
    pub mode: String,
    pub income_bracket: String,
    pub profile: ModeEconomicProfile,
    pub plan: ModePlan,
}

/// Optimize every objective for every group, with fare bounds
/// `[lower × base, upper × base]` around each group's mean fare.
pub fn optimize_income_groups(
    optimizer: &FareOptimizer,
    groups: &[IncomeGroupProfile],
    lower_multiplier: f64,
    upper_multiplier: f64,
) -> Result<Vec<IncomeGroupPlan>> {
    let jobs = groups
        .iter()
        .map(|group| {
            let bounds = PriceBounds::around(
                group.profile.base_price(),
                lower_multiplier,
                upper_multiplier,
            )?;
            Ok(ModeJob::new(FareModel::from_profile(&group.profile)?, bounds))
        })
        .collect::<Result<Vec<_>>>()
        .context("building income group jobs")?;
    let plans = optimizer
        .optimize_modes(&jobs)
        .context("optimizing income group fares")?;
    info!(groups = plans.len(), "income group fares optimized");

    Ok(groups
        .iter()
        .zip(plans)
        .map(|(group, plan)| IncomeGroupPlan {
            mode: group.mode.clone(),
            income_bracket: group.income_bracket.clone(),
            profile: group.profile.clone(),
            plan,
        })
        .collect())
}
