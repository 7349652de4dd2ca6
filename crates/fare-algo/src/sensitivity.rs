//! One-parameter sensitivity sweeps.
//!
//! A sweep substitutes one profile field and re-optimizes. A custom cost
//! model on the swept [`FareModel`] is carried to every point, except for a
//! `unit_cost` sweep, which by definition varies the linear cost curve.

use std::fmt;
use std::str::FromStr;

use fare_core::{FareError, FareModel, FareResult, ModeEconomicProfile, PriceBounds};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::objective::ObjectiveKind;
use crate::optimizer::{FareOptimizer, OptimizationResult};

/// Profile field substituted during a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepParameter {
    PriceElasticity,
    BaseDemand,
    BasePrice,
    UnitCost,
}

impl SweepParameter {
    /// Copy of `profile` with this parameter set to `value`.
    pub fn apply(
        &self,
        profile: &ModeEconomicProfile,
        value: f64,
    ) -> FareResult<ModeEconomicProfile> {
        match self {
            SweepParameter::PriceElasticity => profile.with_price_elasticity(value),
            SweepParameter::BaseDemand => profile.with_base_demand(value),
            SweepParameter::BasePrice => profile.with_base_price(value),
            SweepParameter::UnitCost => profile.with_unit_cost(value),
        }
    }

    /// Copy of `model` with this parameter set to `value`.
    pub fn apply_to_model(&self, model: &FareModel, value: f64) -> FareResult<FareModel> {
        let swept = FareModel::from_profile(&self.apply(model.profile(), value)?)?;
        match self {
            SweepParameter::UnitCost => Ok(swept),
            _ => swept.with_cost_model(model.cost_model().clone()),
        }
    }
}

impl fmt::Display for SweepParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepParameter::PriceElasticity => write!(f, "price_elasticity"),
            SweepParameter::BaseDemand => write!(f, "base_demand"),
            SweepParameter::BasePrice => write!(f, "base_price"),
            SweepParameter::UnitCost => write!(f, "unit_cost"),
        }
    }
}

impl FromStr for SweepParameter {
    type Err = FareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "price_elasticity" | "elasticity" => Ok(SweepParameter::PriceElasticity),
            "base_demand" => Ok(SweepParameter::BaseDemand),
            "base_price" => Ok(SweepParameter::BasePrice),
            "unit_cost" | "cost_per_unit" => Ok(SweepParameter::UnitCost),
            _ => Err(FareError::UnknownParameter(format!("sweep parameter '{}'", s))),
        }
    }
}

/// One swept value and the optimum found for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub value: f64,
    pub result: OptimizationResult,
}

impl FareOptimizer {
    /// Re-optimize `kind` once per value, in the order given.
    ///
    /// Bounds stay fixed across the sweep. Non-convergence is carried in each
    /// point's result; an invalid substituted profile aborts the sweep.
    pub fn sweep(
        &self,
        parameter: SweepParameter,
        values: &[f64],
        base_profile: &ModeEconomicProfile,
        bounds: &PriceBounds,
        kind: ObjectiveKind,
    ) -> FareResult<Vec<SweepPoint>> {
        let model = FareModel::from_profile(base_profile)?;
        self.sweep_model(parameter, values, &model, bounds, kind)
    }

    /// [`FareOptimizer::sweep`] over a model, keeping its cost curve.
    pub fn sweep_model(
        &self,
        parameter: SweepParameter,
        values: &[f64],
        base_model: &FareModel,
        bounds: &PriceBounds,
        kind: ObjectiveKind,
    ) -> FareResult<Vec<SweepPoint>> {
        values
            .iter()
            .map(|&value| {
                let model = parameter.apply_to_model(base_model, value)?;
                let result = self.optimize_model(kind, &model, bounds)?;
                debug!(
                    mode = base_model.name(),
                    %parameter,
                    value,
                    price = result.optimal_price,
                    "sweep point"
                );
                Ok(SweepPoint { value, result })
            })
            .collect()
    }
}

/// Sweep with default optimizer settings.
pub fn sweep(
    parameter: SweepParameter,
    values: &[f64],
    base_profile: &ModeEconomicProfile,
    bounds: &PriceBounds,
    kind: ObjectiveKind,
) -> FareResult<Vec<SweepPoint>> {
    FareOptimizer::new().sweep(parameter, values, base_profile, bounds, kind)
}

/// [`sweep`] for the social-welfare objective.
pub fn sweep_welfare(
    parameter: SweepParameter,
    values: &[f64],
    base_profile: &ModeEconomicProfile,
    bounds: &PriceBounds,
) -> FareResult<Vec<SweepPoint>> {
    sweep(
        parameter,
        values,
        base_profile,
        bounds,
        ObjectiveKind::MaxSocialWelfare,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use fare_core::CostModel;

    fn bus() -> ModeEconomicProfile {
        ModeEconomicProfile::new("Bus", 40.0, 500.0, -0.5, 24.0).unwrap()
    }

    #[test]
    fn test_parameter_parsing() {
        assert_eq!(
            "price_elasticity".parse::<SweepParameter>().unwrap(),
            SweepParameter::PriceElasticity
        );
        assert_eq!("unit-cost".parse::<SweepParameter>().unwrap(), SweepParameter::UnitCost);
        assert!(matches!(
            "wait_time".parse::<SweepParameter>(),
            Err(FareError::UnknownParameter(_))
        ));
    }

    #[test]
    fn test_apply_substitutes_one_field() {
        let swept = SweepParameter::BaseDemand.apply(&bus(), 800.0).unwrap();
        assert_eq!(swept.base_demand(), 800.0);
        assert_eq!(swept.base_price(), 40.0);
        assert!(SweepParameter::BasePrice.apply(&bus(), -1.0).is_err());
    }

    #[test]
    fn test_sweep_keeps_input_order() {
        let bounds = PriceBounds::new(20.0, 80.0).unwrap();
        let values = [900.0, 100.0, 500.0];
        let points = sweep(
            SweepParameter::BaseDemand,
            &values,
            &bus(),
            &bounds,
            ObjectiveKind::MaxRevenue,
        )
        .unwrap();
        let swept: Vec<f64> = points.iter().map(|p| p.value).collect();
        assert_eq!(swept, values);
    }

    #[test]
    fn test_invalid_value_aborts_sweep() {
        let bounds = PriceBounds::new(20.0, 80.0).unwrap();
        let err = sweep_welfare(SweepParameter::UnitCost, &[10.0, -1.0], &bus(), &bounds)
            .unwrap_err();
        assert!(matches!(err, FareError::InvalidProfile(_)));
    }

    fn congested_leguna() -> FareModel {
        let leguna = ModeEconomicProfile::new("Leguna", 30.0, 300.0, -1.5, 15.0).unwrap();
        FareModel::from_profile(&leguna)
            .unwrap()
            .with_cost_model(CostModel::quadratic(15.0, 0.05))
            .unwrap()
    }

    #[test]
    fn test_model_sweep_keeps_custom_cost() {
        let model = congested_leguna();
        let bounds = PriceBounds::new(15.0, 90.0).unwrap();
        let optimizer = FareOptimizer::new();

        let swept = model.profile().with_base_demand(400.0).unwrap();
        let expected = FareModel::from_profile(&swept)
            .unwrap()
            .with_cost_model(CostModel::quadratic(15.0, 0.05))
            .unwrap();
        let direct = optimizer
            .optimize_model(ObjectiveKind::MaxProfit, &expected, &bounds)
            .unwrap();

        let points = optimizer
            .sweep_model(
                SweepParameter::BaseDemand,
                &[400.0],
                &model,
                &bounds,
                ObjectiveKind::MaxProfit,
            )
            .unwrap();
        assert_eq!(points[0].result, direct);

        // Linear markup rule gives 45; rising marginal cost pushes the fare to about 75.
        let linear = optimizer
            .sweep(
                SweepParameter::BaseDemand,
                &[400.0],
                model.profile(),
                &bounds,
                ObjectiveKind::MaxProfit,
            )
            .unwrap();
        assert!(linear[0].result.optimal_price < direct.optimal_price);
    }

    #[test]
    fn test_unit_cost_sweep_replaces_custom_cost() {
        let swept = SweepParameter::UnitCost
            .apply_to_model(&congested_leguna(), 20.0)
            .unwrap();
        assert_eq!(swept.cost_model(), &CostModel::linear(20.0));

        let kept = SweepParameter::PriceElasticity
            .apply_to_model(&congested_leguna(), -1.2)
            .unwrap();
        assert_eq!(kept.cost_model(), &CostModel::quadratic(15.0, 0.05));
        assert_eq!(kept.demand_curve().elasticity(), -1.2);
    }
}
