//! One mode's demand and cost curves bundled for evaluation.

use crate::{CostModel, DemandCurve, FareResult, ModeEconomicProfile};

/// Demand and cost functions derived from a [`ModeEconomicProfile`].
///
/// The default cost is linear in `unit_cost`; callers with better operating
/// data can swap in any validated [`CostModel`].
#[derive(Debug, Clone, PartialEq)]
pub struct FareModel {
    profile: ModeEconomicProfile,
    demand: DemandCurve,
    cost: CostModel,
}

impl FareModel {
    pub fn from_profile(profile: &ModeEconomicProfile) -> FareResult<Self> {
        let demand = DemandCurve::isoelastic(
            profile.base_demand(),
            profile.base_price(),
            profile.price_elasticity(),
        )?;
        Ok(Self {
            profile: profile.clone(),
            demand,
            cost: CostModel::linear(profile.unit_cost()),
        })
    }

    /// Replace the cost function after checking its contract.
    pub fn with_cost_model(mut self, cost: CostModel) -> FareResult<Self> {
        cost.validate()?;
        self.cost = cost;
        Ok(self)
    }

    pub fn profile(&self) -> &ModeEconomicProfile {
        &self.profile
    }

    pub fn name(&self) -> &str {
        self.profile.name()
    }

    pub fn demand_curve(&self) -> &DemandCurve {
        &self.demand
    }

    pub fn cost_model(&self) -> &CostModel {
        &self.cost
    }

    /// `D(p)`
    pub fn demand(&self, price: f64) -> f64 {
        self.demand.quantity(price)
    }

    /// `C(q)`
    pub fn cost(&self, trips: f64) -> f64 {
        self.cost.evaluate(trips)
    }
}
