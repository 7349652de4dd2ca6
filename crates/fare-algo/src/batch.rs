//! Multi-mode optimization runs.
//!
//! Every (mode, objective) pair is independent, so with the `parallel`
//! feature they are fanned out over the rayon pool and collected before
//! anything is regrouped. Ranking only ever sees the joined output.

use std::collections::{HashMap, HashSet};

use fare_core::{FareError, FareModel, FareResult, PriceBounds};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::objective::ObjectiveKind;
use crate::optimizer::{FareOptimizer, ModeResults, OptimizationResult};

/// One mode to optimize over its own price interval.
#[derive(Debug, Clone)]
pub struct ModeJob {
    pub model: FareModel,
    pub bounds: PriceBounds,
}

impl ModeJob {
    pub fn new(model: FareModel, bounds: PriceBounds) -> Self {
        Self { model, bounds }
    }
}

/// All five optimal fares for one mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModePlan {
    pub mode: String,
    pub bounds: PriceBounds,
    pub results: ModeResults,
}

impl FareOptimizer {
    /// Optimize every objective for every job.
    ///
    /// Plans come back in job order. Mode names must be unique.
    pub fn optimize_modes(&self, jobs: &[ModeJob]) -> FareResult<Vec<ModePlan>> {
        let mut seen = HashSet::new();
        for job in jobs {
            if !seen.insert(job.model.name()) {
                return Err(FareError::InvalidProfile(format!(
                    "duplicate mode name '{}'",
                    job.model.name()
                )));
            }
        }

        let tasks: Vec<(usize, ObjectiveKind)> = (0..jobs.len())
            .flat_map(|i| ObjectiveKind::ALL.into_iter().map(move |kind| (i, kind)))
            .collect();

        type Solved = FareResult<(usize, OptimizationResult)>;
        let run = |&(i, kind): &(usize, ObjectiveKind)| -> Solved {
            let job = &jobs[i];
            Ok((i, self.optimize_model(kind, &job.model, &job.bounds)?))
        };

        #[cfg(feature = "parallel")]
        let solved: Vec<Solved> = tasks.par_iter().map(run).collect();
        #[cfg(not(feature = "parallel"))]
        let solved: Vec<Solved> = tasks.iter().map(run).collect();

        let mut plans: Vec<ModePlan> = jobs
            .iter()
            .map(|job| ModePlan {
                mode: job.model.name().to_string(),
                bounds: job.bounds,
                results: ModeResults::new(),
            })
            .collect();
        for entry in solved {
            let (i, result) = entry?;
            plans[i].results.insert(result.objective, result);
        }

        info!(modes = plans.len(), optimizations = tasks.len(), "batch optimization complete");
        Ok(plans)
    }
}

/// Re-key plans by mode name for [`crate::mcda::rank`].
pub fn results_by_mode(plans: &[ModePlan]) -> HashMap<String, ModeResults> {
    plans
        .iter()
        .map(|plan| (plan.mode.clone(), plan.results.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fare_core::ModeEconomicProfile;

    fn job(name: &str, price: f64) -> ModeJob {
        let profile = ModeEconomicProfile::new(name, price, 300.0, -0.6, price * 0.6).unwrap();
        ModeJob::new(
            FareModel::from_profile(&profile).unwrap(),
            PriceBounds::around(price, 0.5, 2.0).unwrap(),
        )
    }

    #[test]
    fn test_plans_follow_job_order() {
        let jobs = vec![job("Rickshaw", 30.0), job("Bus", 40.0), job("Ferry", 15.0)];
        let plans = FareOptimizer::new().optimize_modes(&jobs).unwrap();
        let names: Vec<&str> = plans.iter().map(|p| p.mode.as_str()).collect();
        assert_eq!(names, ["Rickshaw", "Bus", "Ferry"]);
        for plan in &plans {
            assert_eq!(plan.results.len(), 5);
        }
    }

    #[test]
    fn test_batch_matches_individual_runs() {
        let jobs = vec![job("Bus", 40.0), job("Ferry", 15.0)];
        let optimizer = FareOptimizer::new();
        let plans = optimizer.optimize_modes(&jobs).unwrap();
        let single = optimizer
            .optimize_model(ObjectiveKind::MaxProfit, &jobs[1].model, &jobs[1].bounds)
            .unwrap();
        assert_eq!(plans[1].results[&ObjectiveKind::MaxProfit], single);
    }

    #[test]
    fn test_duplicate_modes_rejected() {
        let jobs = vec![job("Bus", 40.0), job("Bus", 45.0)];
        assert!(FareOptimizer::new().optimize_modes(&jobs).is_err());
    }

    #[test]
    fn test_results_by_mode() {
        let plans = FareOptimizer::new()
            .optimize_modes(&[job("Bus", 40.0)])
            .unwrap();
        let map = results_by_mode(&plans);
        assert!(map["Bus"].contains_key(&ObjectiveKind::MaxDemand));
    }

    #[test]
    fn test_plan_json_keys_are_objective_names() {
        let plans = FareOptimizer::new()
            .optimize_modes(&[job("Bus", 40.0)])
            .unwrap();
        let json = serde_json::to_value(&plans[0]).unwrap();
        assert_eq!(json["mode"], "Bus");
        assert!(json["results"]["max_social_welfare"]["optimal_price"].is_number());

        let back: ModePlan = serde_json::from_value(json).unwrap();
        assert_eq!(back.results.len(), 5);
    }
}
