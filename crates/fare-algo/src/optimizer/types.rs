use serde::{Deserialize, Serialize};

use crate::objective::{ObjectiveKind, PriceOutcome};
use crate::optimizer::blend::ObjectiveBlend;

/// Optimal fare for one objective and one mode.
///
/// Every quantity is recomputed at `optimal_price` after the search, never
/// carried over from intermediate iterations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    // === Status ===
    pub objective: ObjectiveKind,
    /// False when local refinement failed and the best grid point was used
    pub converged: bool,
    pub iterations: u64,

    // === Optimum ===
    pub optimal_price: f64,
    pub objective_value: f64,

    // === Derived at optimal_price ===
    pub demand_at_optimum: f64,
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
    pub consumer_surplus: f64,
    pub social_welfare: f64,
}

impl OptimizationResult {
    pub(crate) fn from_outcome(
        objective: ObjectiveKind,
        outcome: PriceOutcome,
        converged: bool,
        iterations: u64,
    ) -> Self {
        Self {
            objective,
            converged,
            iterations,
            optimal_price: outcome.price,
            objective_value: outcome.value(objective),
            demand_at_optimum: outcome.demand,
            revenue: outcome.revenue,
            cost: outcome.cost,
            profit: outcome.profit,
            consumer_surplus: outcome.consumer_surplus,
            social_welfare: outcome.social_welfare,
        }
    }

    /// The optimal policy under this objective serves nobody.
    pub fn is_zero_ridership(&self) -> bool {
        self.demand_at_optimum <= 0.0
    }
}

/// Result of the weighted multi-objective model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendResult {
    pub weights: ObjectiveBlend,
    pub converged: bool,
    pub iterations: u64,
    pub objective_value: f64,
    pub outcome: PriceOutcome,
}

impl BlendResult {
    pub fn optimal_price(&self) -> f64 {
        self.outcome.price
    }
}
