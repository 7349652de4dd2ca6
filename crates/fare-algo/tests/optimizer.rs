//! Single-objective optimizer tests

use fare_algo::{optimize, FareOptimizer, ObjectiveKind, SurplusModel, WelfareSettings};
use fare_core::{CostModel, FareError, FareModel, ModeEconomicProfile, PriceBounds};

fn bus() -> ModeEconomicProfile {
    ModeEconomicProfile::new("Bus", 40.0, 500.0, -0.5, 24.0).expect("valid bus profile")
}

fn elastic_mode(unit_cost: f64) -> ModeEconomicProfile {
    ModeEconomicProfile::new("Rickshaw", 30.0, 200.0, -1.5, unit_cost).expect("valid profile")
}

#[test]
fn test_optimal_price_stays_within_bounds() {
    let cases = [
        (bus(), PriceBounds::new(20.0, 80.0).unwrap()),
        (elastic_mode(10.0), PriceBounds::new(5.0, 90.0).unwrap()),
        (elastic_mode(0.0), PriceBounds::new(0.5, 60.0).unwrap()),
    ];
    for (profile, bounds) in &cases {
        for kind in ObjectiveKind::ALL {
            let result = optimize(kind, profile, bounds).expect("optimization should succeed");
            assert!(
                bounds.contains(result.optimal_price),
                "{kind} for {} left bounds: {}",
                profile.name(),
                result.optimal_price
            );
        }
    }
}

#[test]
fn test_higher_unit_cost_never_raises_optimal_profit() {
    let bounds = PriceBounds::new(5.0, 90.0).unwrap();
    let mut previous = f64::INFINITY;
    for unit_cost in [0.0, 5.0, 10.0, 20.0, 40.0] {
        let result = optimize(ObjectiveKind::MaxProfit, &elastic_mode(unit_cost), &bounds)
            .expect("profit optimization");
        assert!(
            result.profit <= previous + 1e-6,
            "profit rose from {previous} to {} at unit cost {unit_cost}",
            result.profit
        );
        previous = result.profit;
    }
}

#[test]
fn test_identical_inputs_give_identical_results() {
    let bounds = PriceBounds::new(20.0, 80.0).unwrap();
    for kind in ObjectiveKind::ALL {
        let first = optimize(kind, &bus(), &bounds).unwrap();
        let second = optimize(kind, &bus(), &bounds).unwrap();
        assert_eq!(first.optimal_price.to_bits(), second.optimal_price.to_bits());
        assert_eq!(first.objective_value.to_bits(), second.objective_value.to_bits());
        assert_eq!(first, second);
    }
}

#[test]
fn test_degenerate_bounds_for_every_objective() {
    let bounds = PriceBounds::new(50.0, 50.0).unwrap();
    for kind in ObjectiveKind::ALL {
        let result = optimize(kind, &bus(), &bounds).unwrap();
        assert_eq!(result.optimal_price, 50.0);
        assert!(result.converged, "{kind} should report convergence");
        assert_eq!(result.iterations, 0);
    }
}

#[test]
fn test_free_fare_bound_is_rejected_for_falling_demand() {
    // D(p) grows without limit as p → 0, so a lower bound of 0 has no
    // meaningful optimum for any objective.
    let optimizer = FareOptimizer::new();
    let model = FareModel::from_profile(&bus()).unwrap();
    for bounds in [PriceBounds::new(0.0, 80.0).unwrap(), PriceBounds::new(0.0, 0.0).unwrap()] {
        let err = optimizer
            .optimize_model(ObjectiveKind::MaxDemand, &model, &bounds)
            .unwrap_err();
        assert!(matches!(err, FareError::InvalidBounds { .. }), "{err}");
        assert!(optimizer.optimize_all(&model, &bounds).is_err());
    }
}

#[test]
fn test_free_fare_bound_is_allowed_without_riders() {
    let ghost = ModeEconomicProfile::new("Ghost", 20.0, 0.0, -0.8, 5.0).unwrap();
    let bounds = PriceBounds::new(0.0, 40.0).unwrap();
    let result = optimize(ObjectiveKind::MaxDemand, &ghost, &bounds).unwrap();
    assert!(result.is_zero_ridership());
    assert!(bounds.contains(result.optimal_price));
}

#[test]
fn test_zero_base_demand_is_a_valid_result() {
    let ghost = ModeEconomicProfile::new("Ghost", 20.0, 0.0, -0.8, 5.0).unwrap();
    let bounds = PriceBounds::around(20.0, 0.5, 2.0).unwrap();
    let result = optimize(ObjectiveKind::MaxRevenue, &ghost, &bounds).unwrap();
    assert!(result.is_zero_ridership());
    assert!(bounds.contains(result.optimal_price));
}

#[test]
fn test_derived_fields_recomputed_at_optimum() {
    let bounds = PriceBounds::new(20.0, 80.0).unwrap();
    let model = FareModel::from_profile(&bus()).unwrap();
    for kind in ObjectiveKind::ALL {
        let r = optimize(kind, &bus(), &bounds).unwrap();
        assert_eq!(r.demand_at_optimum, model.demand(r.optimal_price));
        assert_eq!(r.cost, model.cost(r.demand_at_optimum));
        assert_eq!(r.objective, kind);
    }
}

#[test]
fn test_isoelastic_surplus_moves_welfare_optimum_inside() {
    let bounds = PriceBounds::new(20.0, 80.0).unwrap();
    let exact = FareOptimizer::new()
        .with_welfare(WelfareSettings::default().with_surplus(SurplusModel::IsoelasticIntegral));
    let result = exact
        .optimize(ObjectiveKind::MaxSocialWelfare, &bus(), &bounds)
        .unwrap();
    assert!(result.converged);
    assert!(result.optimal_price > 20.0 && result.optimal_price < 40.0);
}

#[test]
fn test_quadratic_cost_lowers_profit_maximizing_demand() {
    let bounds = PriceBounds::new(5.0, 90.0).unwrap();
    let profile = elastic_mode(10.0);
    let linear = FareModel::from_profile(&profile).unwrap();
    let congested = FareModel::from_profile(&profile)
        .unwrap()
        .with_cost_model(CostModel::quadratic(10.0, 0.05))
        .unwrap();

    let optimizer = FareOptimizer::new();
    let base = optimizer
        .optimize_model(ObjectiveKind::MaxProfit, &linear, &bounds)
        .unwrap();
    let steep = optimizer
        .optimize_model(ObjectiveKind::MaxProfit, &congested, &bounds)
        .unwrap();
    assert!(steep.optimal_price >= base.optimal_price);
    assert!(steep.demand_at_optimum <= base.demand_at_optimum);
}

#[test]
fn test_invalid_cost_model_is_rejected() {
    let result = FareModel::from_profile(&bus())
        .unwrap()
        .with_cost_model(CostModel::Polynomial { coeffs: vec![-1.0] });
    assert!(matches!(result, Err(FareError::InvalidParameter(_))));
}
