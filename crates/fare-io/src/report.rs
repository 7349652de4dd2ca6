//! Analysis reports in JSON and Markdown.

use std::fmt::Write as _;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use fare_algo::{
    BlendResult, ModePlan, ModeRanking, ObjectiveKind, OptimizationResult, SweepParameter,
    SweepPoint,
};
use fare_core::{Diagnostics, ModeEconomicProfile};
use serde::Serialize;

use crate::equity::EquityReport;
use crate::income::IncomeGroupPlan;
use crate::policy::PolicyOutcome;

/// One declared sweep and its points.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub mode: String,
    pub parameter: SweepParameter,
    pub objective: ObjectiveKind,
    pub points: Vec<SweepPoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlendReport {
    pub mode: String,
    pub result: BlendResult,
}

/// Everything one analysis run produced.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub modes: Vec<ModeEconomicProfile>,
    pub plans: Vec<ModePlan>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rankings: Vec<ModeRanking>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sweeps: Vec<SweepReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub blends: Vec<BlendReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equity: Option<EquityReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub policies: Vec<PolicyOutcome>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub income_plans: Vec<IncomeGroupPlan>,
    pub diagnostics: Diagnostics,
}

impl AnalysisReport {
    pub fn new(
        title: impl Into<String>,
        modes: Vec<ModeEconomicProfile>,
        plans: Vec<ModePlan>,
    ) -> Self {
        Self {
            title: title.into(),
            generated_at: Utc::now(),
            modes,
            plans,
            rankings: Vec::new(),
            sweeps: Vec::new(),
            blends: Vec::new(),
            equity: None,
            policies: Vec::new(),
            income_plans: Vec::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn with_rankings(mut self, rankings: Vec<ModeRanking>) -> Self {
        self.rankings = rankings;
        self
    }

    pub fn with_sweeps(mut self, sweeps: Vec<SweepReport>) -> Self {
        self.sweeps = sweeps;
        self
    }

    pub fn with_blends(mut self, blends: Vec<BlendReport>) -> Self {
        self.blends = blends;
        self
    }

    pub fn with_equity(mut self, equity: EquityReport, policies: Vec<PolicyOutcome>) -> Self {
        self.equity = Some(equity);
        self.policies = policies;
        self
    }

    pub fn with_income_plans(mut self, income_plans: Vec<IncomeGroupPlan>) -> Self {
        self.income_plans = income_plans;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Optimizations that fell back to a grid point or serve nobody, mode
    /// plans first, then income group plans.
    pub fn flagged_results(&self) -> impl Iterator<Item = (&str, &OptimizationResult)> {
        let income_plans = self.income_plans.iter().map(|group| &group.plan);
        self.plans.iter().chain(income_plans).flat_map(|plan| {
            plan.results
                .values()
                .filter(|r| !r.converged || r.is_zero_ridership())
                .map(move |r| (plan.mode.as_str(), r))
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serializing report to JSON")
    }

    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        // Writing into a String cannot fail.
        let _ = self.render_markdown(&mut md);
        md
    }

    fn render_markdown(&self, md: &mut String) -> std::fmt::Result {
        writeln!(md, "# {}", self.title)?;
        writeln!(md)?;
        writeln!(md, "_Generated {}_", self.generated_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        writeln!(md)?;

        writeln!(md, "## Modes")?;
        writeln!(md)?;
        writeln!(md, "| Mode | Base fare | Base trips | Elasticity | Unit cost |")?;
        writeln!(md, "|------|-----------|------------|------------|-----------|")?;
        for m in &self.modes {
            writeln!(
                md,
                "| {} | {:.2} | {:.0} | {:.2} | {:.2} |",
                m.name(),
                m.base_price(),
                m.base_demand(),
                m.price_elasticity(),
                m.unit_cost()
            )?;
        }
        writeln!(md)?;

        writeln!(md, "## Optimal fares")?;
        for plan in &self.plans {
            writeln!(md)?;
            writeln!(
                md,
                "### {} (fares {:.2} to {:.2})",
                plan.mode,
                plan.bounds.lo(),
                plan.bounds.hi()
            )?;
            writeln!(md)?;
            writeln!(
                md,
                "| Model | Fare | Demand | Revenue | Profit | Welfare | Converged | Note |"
            )?;
            writeln!(
                md,
                "|-------|------|--------|---------|--------|---------|-----------|------|"
            )?;
            for r in plan.results.values() {
                let note = if r.is_zero_ridership() { "zero ridership" } else { "" };
                writeln!(
                    md,
                    "| {} | {:.2} | {:.1} | {:.2} | {:.2} | {:.2} | {} | {} |",
                    r.objective.code(),
                    r.optimal_price,
                    r.demand_at_optimum,
                    r.revenue,
                    r.profit,
                    r.social_welfare,
                    if r.converged { "yes" } else { "no" },
                    note
                )?;
            }
        }
        writeln!(md)?;

        if !self.rankings.is_empty() {
            writeln!(md, "## Multi-criteria ranking")?;
            writeln!(md)?;
            let metrics: Vec<_> = self.rankings[0]
                .per_criterion_normalized_score
                .keys()
                .copied()
                .collect();
            write!(md, "| Rank | Mode | Score |")?;
            for metric in &metrics {
                write!(md, " {} |", metric)?;
            }
            writeln!(md)?;
            write!(md, "|------|------|-------|")?;
            for _ in &metrics {
                write!(md, "------|")?;
            }
            writeln!(md)?;
            for r in &self.rankings {
                write!(md, "| {} | {} | {:.3} |", r.rank, r.mode, r.weighted_score)?;
                for metric in &metrics {
                    let score = r
                        .per_criterion_normalized_score
                        .get(metric)
                        .copied()
                        .unwrap_or(0.0);
                    write!(md, " {:.3} |", score)?;
                }
                writeln!(md)?;
            }
            writeln!(md)?;
        }

        if !self.blends.is_empty() {
            writeln!(md, "## Weighted multi-objective fares")?;
            writeln!(md)?;
            writeln!(md, "| Mode | Fare | Demand | Blended value | Converged |")?;
            writeln!(md, "|------|------|--------|---------------|-----------|")?;
            for b in &self.blends {
                writeln!(
                    md,
                    "| {} | {:.2} | {:.1} | {:.2} | {} |",
                    b.mode,
                    b.result.optimal_price(),
                    b.result.outcome.demand,
                    b.result.objective_value,
                    if b.result.converged { "yes" } else { "no" }
                )?;
            }
            writeln!(md)?;
        }

        for sweep in &self.sweeps {
            writeln!(
                md,
                "## Sensitivity: {} {} ({})",
                sweep.mode,
                sweep.parameter,
                sweep.objective.code()
            )?;
            writeln!(md)?;
            writeln!(md, "| {} | Fare | Demand | Objective | Converged |", sweep.parameter)?;
            writeln!(md, "|------|------|--------|-----------|-----------|")?;
            for point in &sweep.points {
                writeln!(
                    md,
                    "| {} | {:.2} | {:.1} | {:.2} | {} |",
                    point.value,
                    point.result.optimal_price,
                    point.result.demand_at_optimum,
                    point.result.objective_value,
                    if point.result.converged { "yes" } else { "no" }
                )?;
            }
            writeln!(md)?;
        }

        if let Some(equity) = &self.equity {
            writeln!(md, "## Affordability by income")?;
            writeln!(md)?;
            writeln!(md, "| Income | Trips | Mean fare/WTP | Median | Unaffordable |")?;
            writeln!(md, "|--------|-------|---------------|--------|--------------|")?;
            for (group, a) in &equity.affordability_by_income {
                writeln!(
                    md,
                    "| {} | {} | {:.3} | {:.3} | {:.1}% |",
                    group, a.trips, a.mean_ratio, a.median, a.unaffordable_percentage
                )?;
            }
            writeln!(md)?;
            writeln!(md, "| Mode | Gini (affordability) |")?;
            writeln!(md, "|------|----------------------|")?;
            for (mode, gini) in &equity.gini_by_mode {
                writeln!(md, "| {} | {:.3} |", mode, gini)?;
            }
            writeln!(md)?;
        }

        if !self.policies.is_empty() {
            writeln!(md, "## Subsidy policies")?;
            writeln!(md)?;
            writeln!(
                md,
                "| Policy | Subsidy cost | Trips made affordable | Trips per unit cost |"
            )?;
            writeln!(
                md,
                "|--------|--------------|-----------------------|---------------------|"
            )?;
            for p in &self.policies {
                writeln!(
                    md,
                    "| {} | {:.2} | {} | {:.4} |",
                    p.policy,
                    p.total_subsidy_cost,
                    p.accessibility_improvement,
                    p.cost_effectiveness
                )?;
            }
            writeln!(md)?;
        }

        if !self.income_plans.is_empty() {
            writeln!(md, "## Fares by income group")?;
            writeln!(md)?;
            write!(md, "| Mode | Income | Mean fare | Trips | Elasticity |")?;
            for kind in ObjectiveKind::ALL {
                write!(md, " {} |", kind.code())?;
            }
            writeln!(md)?;
            write!(md, "|------|--------|-----------|-------|------------|")?;
            for _ in ObjectiveKind::ALL {
                write!(md, "------|")?;
            }
            writeln!(md)?;
            for group in &self.income_plans {
                write!(
                    md,
                    "| {} | {} | {:.2} | {:.0} | {:.2} |",
                    group.mode,
                    group.income_bracket,
                    group.profile.base_price(),
                    group.profile.base_demand(),
                    group.profile.price_elasticity()
                )?;
                for kind in ObjectiveKind::ALL {
                    match group.plan.results.get(&kind) {
                        Some(r) => write!(md, " {:.2} |", r.optimal_price)?,
                        None => write!(md, " - |")?,
                    }
                }
                writeln!(md)?;
            }
            writeln!(md)?;
        }

        let flagged: Vec<_> = self.flagged_results().collect();
        if !flagged.is_empty() || self.diagnostics.has_issues() {
            writeln!(md, "## Warnings")?;
            writeln!(md)?;
            for (mode, r) in flagged {
                if !r.converged {
                    writeln!(
                        md,
                        "- {} {}: refinement did not converge, best grid fare used",
                        mode,
                        r.objective.code()
                    )?;
                }
                if r.is_zero_ridership() {
                    let code = r.objective.code();
                    writeln!(md, "- {} {}: optimal fare serves no trips", mode, code)?;
                }
            }
            for issue in &self.diagnostics.issues {
                writeln!(md, "- {}", issue)?;
            }
        }
        Ok(())
    }
}

pub fn write_json(report: &AnalysisReport, path: &Path) -> Result<()> {
    let json = report.to_json()?;
    let mut file = File::create(path)
        .with_context(|| format!("creating report file {}", path.display()))?;
    file.write_all(json.as_bytes())
        .context("writing JSON report")?;
    Ok(())
}

pub fn write_markdown(report: &AnalysisReport, path: &Path) -> Result<()> {
    std::fs::write(path, report.to_markdown())
        .with_context(|| format!("writing Markdown report {}", path.display()))
}
