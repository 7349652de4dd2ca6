//! Single-objective fare optimization
//!
//! [`FareOptimizer`] finds, for one mode and one price interval, the fare that
//! maximizes a chosen [`ObjectiveKind`]. The search is a coarse grid over the
//! whole interval followed by Brent refinement around the best grid point;
//! see [`search`] for details.
//!
//! Non-convergence of the refinement is not an error: the result carries
//! `converged = false` and the best grid point.
//!
//! A lower bound of 0 is rejected with [`FareError::InvalidBounds`] whenever
//! demand falls with price. Isoelastic demand diverges as `p → 0`, so every
//! objective would chase the bound and report a meaningless optimum there.

mod blend;
pub(crate) mod search;
mod types;

pub use blend::ObjectiveBlend;
pub use types::{BlendResult, OptimizationResult};

use std::collections::BTreeMap;

use fare_core::{FareError, FareModel, FareResult, ModeEconomicProfile, PriceBounds};
use tracing::{debug, warn};

use crate::objective::{ObjectiveEvaluator, ObjectiveKind, PriceOutcome, WelfareSettings};
use search::{maximize, SearchOutcome, SearchSettings};

/// Results for every objective of one mode, keyed by objective.
pub type ModeResults = BTreeMap<ObjectiveKind, OptimizationResult>;

/// Bounded fare optimizer with builder-style configuration.
#[derive(Debug, Clone)]
pub struct FareOptimizer {
    grid_points: usize,
    max_iterations: u64,
    tolerance: f64,
    welfare: WelfareSettings,
    cost_budget: Option<f64>,
}

impl FareOptimizer {
    /// Optimizer with a 101-point grid, 100 Brent iterations and 1e-8 tolerance.
    pub fn new() -> Self {
        Self {
            grid_points: 101,
            max_iterations: 100,
            tolerance: 1e-8,
            welfare: WelfareSettings::default(),
            cost_budget: None,
        }
    }

    /// Number of grid prices evaluated before refinement (at least 3).
    pub fn with_grid_points(mut self, points: usize) -> Self {
        self.grid_points = points;
        self
    }

    pub fn with_max_iterations(mut self, max_iter: u64) -> Self {
        self.max_iterations = max_iter;
        self
    }

    /// Absolute price tolerance of the refinement
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn with_welfare(mut self, welfare: WelfareSettings) -> Self {
        self.welfare = welfare;
        self
    }

    /// Treat prices whose operating cost `C(D(p))` exceeds `budget` as infeasible.
    pub fn with_cost_budget(mut self, budget: f64) -> Self {
        self.cost_budget = Some(budget);
        self
    }

    pub fn welfare(&self) -> &WelfareSettings {
        &self.welfare
    }

    pub fn grid_points(&self) -> usize {
        self.grid_points
    }

    pub fn cost_budget(&self) -> Option<f64> {
        self.cost_budget
    }

    /// Check settings without running anything.
    pub fn validate(&self) -> FareResult<()> {
        self.welfare.validate()?;
        if self.grid_points < 3 {
            return Err(FareError::InvalidParameter(format!(
                "grid_points must be at least 3, got {}",
                self.grid_points
            )));
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(FareError::InvalidParameter(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if let Some(budget) = self.cost_budget {
            if !budget.is_finite() || budget < 0.0 {
                return Err(FareError::InvalidParameter(format!(
                    "cost budget must be non-negative, got {budget}"
                )));
            }
        }
        Ok(())
    }

    fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            grid_points: self.grid_points,
            max_iterations: self.max_iterations,
            tolerance: self.tolerance,
        }
    }

    /// `None` for prices that are infeasible or give non-finite values.
    fn feasible_value(&self, outcome: &PriceOutcome, value: f64) -> Option<f64> {
        if !value.is_finite() {
            return None;
        }
        match self.cost_budget {
            Some(budget) if outcome.cost > budget => None,
            _ => Some(value),
        }
    }

    fn run_search<V>(
        &self,
        evaluator: &ObjectiveEvaluator<'_>,
        bounds: &PriceBounds,
        value_of: V,
    ) -> FareResult<(SearchOutcome, PriceOutcome)>
    where
        V: Fn(&PriceOutcome) -> f64,
    {
        self.validate()?;
        let curve = evaluator.model().demand_curve();
        if bounds.lo() <= 0.0 && curve.elasticity() < 0.0 && curve.base_demand() > 0.0 {
            return Err(FareError::InvalidBounds {
                lo: bounds.lo(),
                hi: bounds.hi(),
            });
        }
        let search = maximize(
            |price| {
                let outcome = evaluator.outcome_at(price);
                self.feasible_value(&outcome, value_of(&outcome))
            },
            bounds,
            &self.search_settings(),
        )?;
        let outcome = evaluator.outcome_at(search.price);
        Ok((search, outcome))
    }

    /// Optimize one objective for a profile with the default linear cost.
    pub fn optimize(
        &self,
        kind: ObjectiveKind,
        profile: &ModeEconomicProfile,
        bounds: &PriceBounds,
    ) -> FareResult<OptimizationResult> {
        let model = FareModel::from_profile(profile)?;
        self.optimize_model(kind, &model, bounds)
    }

    /// Optimize one objective for an explicit demand/cost model.
    pub fn optimize_model(
        &self,
        kind: ObjectiveKind,
        model: &FareModel,
        bounds: &PriceBounds,
    ) -> FareResult<OptimizationResult> {
        let evaluator = ObjectiveEvaluator::new(model, bounds, self.welfare);
        let (search, outcome) =
            self.run_search(&evaluator, bounds, |outcome| outcome.value(kind))?;
        let result =
            OptimizationResult::from_outcome(kind, outcome, search.converged, search.iterations);

        debug!(
            mode = model.name(),
            objective = %kind,
            price = result.optimal_price,
            value = result.objective_value,
            converged = result.converged,
            "objective optimized"
        );
        if result.is_zero_ridership() {
            warn!(
                mode = model.name(),
                objective = %kind,
                price = result.optimal_price,
                "optimal fare yields zero ridership"
            );
        }
        Ok(result)
    }

    /// Run all five objectives for one model.
    pub fn optimize_all(
        &self,
        model: &FareModel,
        bounds: &PriceBounds,
    ) -> FareResult<ModeResults> {
        ObjectiveKind::ALL
            .iter()
            .map(|&kind| Ok((kind, self.optimize_model(kind, model, bounds)?)))
            .collect()
    }

    /// Maximize a weighted blend of all five objectives.
    pub fn optimize_blend(
        &self,
        blend: &ObjectiveBlend,
        model: &FareModel,
        bounds: &PriceBounds,
    ) -> FareResult<BlendResult> {
        blend.validate()?;
        let evaluator = ObjectiveEvaluator::new(model, bounds, self.welfare);
        let (search, outcome) =
            self.run_search(&evaluator, bounds, |outcome| blend.value(outcome))?;

        debug!(
            mode = model.name(),
            price = outcome.price,
            converged = search.converged,
            "blended objective optimized"
        );
        Ok(BlendResult {
            weights: *blend,
            converged: search.converged,
            iterations: search.iterations,
            objective_value: blend.value(&outcome),
            outcome,
        })
    }
}

impl Default for FareOptimizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Optimize one objective with default settings.
pub fn optimize(
    kind: ObjectiveKind,
    profile: &ModeEconomicProfile,
    bounds: &PriceBounds,
) -> FareResult<OptimizationResult> {
    FareOptimizer::new().optimize(kind, profile, bounds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fare_core::CostModel;

    fn elastic_profile() -> ModeEconomicProfile {
        ModeEconomicProfile::new("Elastic", 10.0, 1000.0, -2.0, 2.0).unwrap()
    }

    #[test]
    fn test_profit_optimum_matches_markup_rule() {
        // With constant elasticity ε and marginal cost c, p* = c·ε/(1+ε) = 2c for ε = −2.
        let bounds = PriceBounds::new(1.0, 20.0).unwrap();
        let result = optimize(ObjectiveKind::MaxProfit, &elastic_profile(), &bounds).unwrap();
        assert!(result.converged);
        assert!((result.optimal_price - 4.0).abs() < 1e-4, "got {}", result.optimal_price);
    }

    #[test]
    fn test_revenue_with_elastic_demand_prefers_lowest_price() {
        // R(p) ∝ p^(1+ε) = p^-1 is decreasing.
        let bounds = PriceBounds::new(5.0, 20.0).unwrap();
        let result = optimize(ObjectiveKind::MaxRevenue, &elastic_profile(), &bounds).unwrap();
        assert!((result.optimal_price - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_derived_fields_are_consistent() {
        let bounds = PriceBounds::new(1.0, 20.0).unwrap();
        let r = optimize(ObjectiveKind::MaxSocialWelfare, &elastic_profile(), &bounds).unwrap();
        assert_eq!(r.revenue, r.optimal_price * r.demand_at_optimum);
        assert_eq!(r.profit, r.revenue - r.cost);
        assert_eq!(r.objective_value, r.social_welfare);
    }

    #[test]
    fn test_iteration_cap_falls_back_to_best_grid_price() {
        let bus = ModeEconomicProfile::new("Bus", 40.0, 500.0, -0.5, 24.0).unwrap();
        let bounds = PriceBounds::new(20.0, 80.0).unwrap();
        let result = FareOptimizer::new()
            .with_max_iterations(1)
            .optimize(ObjectiveKind::MaxProfit, &bus, &bounds)
            .unwrap();
        assert!(!result.converged);
        assert_eq!(result.iterations, 1);
        // profit rises with price for inelastic demand; the grid peaks at the upper bound
        assert_eq!(result.optimal_price, 80.0);
        assert!(!result.is_zero_ridership());
    }

    #[test]
    fn test_zero_lower_bound_is_rejected_for_falling_demand() {
        let bus = ModeEconomicProfile::new("Bus", 40.0, 500.0, -0.5, 24.0).unwrap();
        let bounds = PriceBounds::new(0.0, 80.0).unwrap();
        for kind in ObjectiveKind::ALL {
            let err = optimize(kind, &bus, &bounds).unwrap_err();
            assert!(
                matches!(err, FareError::InvalidBounds { lo, hi } if lo == 0.0 && hi == 80.0),
                "{kind}: {err}"
            );
        }
    }

    #[test]
    fn test_zero_lower_bound_is_allowed_for_flat_demand() {
        let flat = ModeEconomicProfile::new("Ferry", 30.0, 200.0, 0.0, 10.0).unwrap();
        let bounds = PriceBounds::new(0.0, 60.0).unwrap();
        let result = optimize(ObjectiveKind::MaxRevenue, &flat, &bounds).unwrap();
        assert!((result.optimal_price - 60.0).abs() < 1e-6);
        assert_eq!(result.demand_at_optimum, 200.0);
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let bounds = PriceBounds::new(1.0, 20.0).unwrap();
        let profile = elastic_profile();
        let bad_grid = FareOptimizer::new().with_grid_points(2);
        assert!(matches!(
            bad_grid.optimize(ObjectiveKind::MaxProfit, &profile, &bounds),
            Err(FareError::InvalidParameter(_))
        ));
        let bad_tol = FareOptimizer::new().with_tolerance(0.0);
        assert!(bad_tol
            .optimize(ObjectiveKind::MaxProfit, &profile, &bounds)
            .is_err());
    }

    #[test]
    fn test_cost_budget_raises_max_demand_price() {
        let profile = ModeEconomicProfile::new("Bus", 40.0, 500.0, -0.5, 24.0).unwrap();
        let bounds = PriceBounds::new(20.0, 80.0).unwrap();
        let unconstrained = optimize(ObjectiveKind::MaxDemand, &profile, &bounds).unwrap();
        assert!((unconstrained.optimal_price - 20.0).abs() < 1e-9);

        // Budget equal to cost of serving base demand: 24 · 500.
        let constrained = FareOptimizer::new()
            .with_cost_budget(12_000.0)
            .optimize(ObjectiveKind::MaxDemand, &profile, &bounds)
            .unwrap();
        assert!(constrained.cost <= 12_000.0 + 1e-6);
        // At worst the first feasible grid price, 40.4.
        assert!(constrained.optimal_price >= 40.0 - 1e-9);
        assert!(constrained.optimal_price <= 40.4 + 1e-9);
    }

    #[test]
    fn test_budget_below_any_feasible_cost_is_infeasible() {
        let profile = ModeEconomicProfile::new("Bus", 40.0, 500.0, -0.5, 24.0).unwrap();
        let bounds = PriceBounds::new(20.0, 80.0).unwrap();
        let err = FareOptimizer::new()
            .with_cost_budget(1.0)
            .optimize(ObjectiveKind::MaxDemand, &profile, &bounds)
            .unwrap_err();
        assert!(matches!(err, FareError::Infeasible(_)));
    }

    #[test]
    fn test_custom_cost_model_changes_profit_optimum() {
        let profile = elastic_profile();
        let bounds = PriceBounds::new(1.0, 20.0).unwrap();
        let model = FareModel::from_profile(&profile)
            .unwrap()
            .with_cost_model(CostModel::linear(3.0))
            .unwrap();
        let r = FareOptimizer::new()
            .optimize_model(ObjectiveKind::MaxProfit, &model, &bounds)
            .unwrap();
        assert!((r.optimal_price - 6.0).abs() < 1e-4);
    }

    #[test]
    fn test_optimize_all_covers_every_objective() {
        let bounds = PriceBounds::new(1.0, 20.0).unwrap();
        let model = FareModel::from_profile(&elastic_profile()).unwrap();
        let all = FareOptimizer::new().optimize_all(&model, &bounds).unwrap();
        assert_eq!(all.len(), 5);
        for (kind, result) in &all {
            assert_eq!(*kind, result.objective);
            assert!(bounds.contains(result.optimal_price));
        }
    }

    #[test]
    fn test_blend_rejects_bad_weights() {
        let bounds = PriceBounds::new(1.0, 20.0).unwrap();
        let model = FareModel::from_profile(&elastic_profile()).unwrap();
        let blend = ObjectiveBlend {
            revenue: 0.5,
            ..ObjectiveBlend::default()
        };
        assert!(matches!(
            FareOptimizer::new().optimize_blend(&blend, &model, &bounds),
            Err(FareError::InvalidWeights(_))
        ));
    }

    #[test]
    fn test_pure_profit_blend_matches_max_profit() {
        let bounds = PriceBounds::new(1.0, 20.0).unwrap();
        let model = FareModel::from_profile(&elastic_profile()).unwrap();
        let blend = ObjectiveBlend {
            revenue: 0.0,
            profit: 1.0,
            benefit: 0.0,
            demand: 0.0,
            welfare: 0.0,
        };
        let optimizer = FareOptimizer::new();
        let blended = optimizer.optimize_blend(&blend, &model, &bounds).unwrap();
        let single = optimizer
            .optimize_model(ObjectiveKind::MaxProfit, &model, &bounds)
            .unwrap();
        assert!((blended.optimal_price() - single.optimal_price).abs() < 1e-9);
    }
}
