use anyhow::{anyhow, Context, Result};
use fare_algo::{rank, results_by_mode, ModePlan, ModeRanking};
use fare_io::{AnalysisReport, BlendReport, SweepReport};
use tracing::info;

use crate::spec::ResolvedAnalysis;

/// Output of a full analysis before it is formatted.
#[derive(Debug, Clone)]
pub struct AnalysisRun {
    pub plans: Vec<ModePlan>,
    pub rankings: Vec<ModeRanking>,
    pub sweeps: Vec<SweepReport>,
    pub blends: Vec<BlendReport>,
}

impl AnalysisRun {
    pub fn into_report(self, analysis: &ResolvedAnalysis) -> AnalysisReport {
        AnalysisReport::new(analysis.title.clone(), analysis.profiles(), self.plans)
            .with_rankings(self.rankings)
            .with_sweeps(self.sweeps)
            .with_blends(self.blends)
    }
}

/// Optimize every mode, rank them, then run declared sweeps and blends.
pub fn run_analysis(analysis: &ResolvedAnalysis) -> Result<AnalysisRun> {
    let plans = optimize_plans(analysis)?;
    let rankings = rank(&analysis.profiles(), &results_by_mode(&plans), &analysis.criteria)
        .context("ranking modes")?;
    let sweeps = run_sweeps(analysis)?;
    let blends = run_blends(analysis)?;
    info!(
        modes = plans.len(),
        sweeps = sweeps.len(),
        blends = blends.len(),
        "analysis complete"
    );
    Ok(AnalysisRun {
        plans,
        rankings,
        sweeps,
        blends,
    })
}

pub fn optimize_plans(analysis: &ResolvedAnalysis) -> Result<Vec<ModePlan>> {
    let jobs = analysis.jobs()?;
    analysis
        .optimizer
        .optimize_modes(&jobs)
        .context("optimizing fares")
}

pub fn run_sweeps(analysis: &ResolvedAnalysis) -> Result<Vec<SweepReport>> {
    analysis
        .sweeps
        .iter()
        .map(|sweep| {
            let mode = analysis
                .mode(&sweep.mode)
                .ok_or_else(|| anyhow!("sweep references unknown mode '{}'", sweep.mode))?;
            let points = analysis
                .optimizer
                .sweep_model(
                    sweep.parameter,
                    &sweep.values,
                    &mode.model()?,
                    &mode.bounds,
                    sweep.objective,
                )
                .with_context(|| {
                    format!("sweeping {} for '{}'", sweep.parameter, sweep.mode)
                })?;
            Ok(SweepReport {
                mode: sweep.mode.clone(),
                parameter: sweep.parameter,
                objective: sweep.objective,
                points,
            })
        })
        .collect()
}

pub fn run_blends(analysis: &ResolvedAnalysis) -> Result<Vec<BlendReport>> {
    let Some(blend) = &analysis.blend else {
        return Ok(Vec::new());
    };
    analysis
        .modes
        .iter()
        .map(|mode| {
            let result = analysis
                .optimizer
                .optimize_blend(blend, &mode.model()?, &mode.bounds)
                .with_context(|| format!("blended optimization for '{}'", mode.profile.name()))?;
            Ok(BlendReport {
                mode: mode.profile.name().to_string(),
                result,
            })
        })
        .collect()
}
