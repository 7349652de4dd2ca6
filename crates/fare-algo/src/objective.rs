//! Fare-planning objectives evaluated as functions of price.
//!
//! All five objectives are derived from one [`PriceOutcome`] so that the
//! value being maximized and the figures reported afterwards can never drift
//! apart:
//!
//! ```text
//! R(p) = p·D(p)
//! P(p) = R(p) − C(D(p))
//! B(p) = ½·(p_ref − p)·D(p)              (linear approximation, default)
//!      = ∫_p^{p_ref} D(x) dx             (isoelastic integral, optional)
//! S(p) = B(p) + P(p) − w_eq·p − w_env·D(p)
//! ```
//!
//! `p_ref` is the upper end of the feasible price range.

use std::fmt;
use std::str::FromStr;

use fare_core::{FareError, FareModel, FareResult, PriceBounds};
use serde::{Deserialize, Serialize};

/// The five single-objective fare plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveKind {
    /// Max-R
    MaxRevenue,
    /// Max-P
    MaxProfit,
    /// Max-B (consumer surplus)
    MaxBenefit,
    /// Max-D (ridership)
    MaxDemand,
    /// Max-S
    MaxSocialWelfare,
}

impl ObjectiveKind {
    pub const ALL: [ObjectiveKind; 5] = [
        ObjectiveKind::MaxRevenue,
        ObjectiveKind::MaxProfit,
        ObjectiveKind::MaxBenefit,
        ObjectiveKind::MaxDemand,
        ObjectiveKind::MaxSocialWelfare,
    ];

    /// Short planning code used in reports (`Max-R`, `Max-P`, ...).
    pub fn code(&self) -> &'static str {
        match self {
            ObjectiveKind::MaxRevenue => "Max-R",
            ObjectiveKind::MaxProfit => "Max-P",
            ObjectiveKind::MaxBenefit => "Max-B",
            ObjectiveKind::MaxDemand => "Max-D",
            ObjectiveKind::MaxSocialWelfare => "Max-S",
        }
    }
}

impl fmt::Display for ObjectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectiveKind::MaxRevenue => write!(f, "max_revenue"),
            ObjectiveKind::MaxProfit => write!(f, "max_profit"),
            ObjectiveKind::MaxBenefit => write!(f, "max_benefit"),
            ObjectiveKind::MaxDemand => write!(f, "max_demand"),
            ObjectiveKind::MaxSocialWelfare => write!(f, "max_social_welfare"),
        }
    }
}

impl FromStr for ObjectiveKind {
    type Err = FareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "max_revenue" | "revenue" | "max_r" => Ok(ObjectiveKind::MaxRevenue),
            "max_profit" | "profit" | "max_p" => Ok(ObjectiveKind::MaxProfit),
            "max_benefit" | "benefit" | "max_b" => Ok(ObjectiveKind::MaxBenefit),
            "max_demand" | "demand" | "max_d" => Ok(ObjectiveKind::MaxDemand),
            "max_social_welfare" | "max_welfare" | "social_welfare" | "welfare" | "max_s" => {
                Ok(ObjectiveKind::MaxSocialWelfare)
            }
            _ => Err(FareError::UnknownParameter(format!("objective '{}'", s))),
        }
    }
}

/// How consumer surplus is computed for Max-B and Max-S.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurplusModel {
    /// `½·(p_ref − p)·D(p)`: triangle under a linear demand assumption,
    /// even though `D` itself is isoelastic.
    #[default]
    LinearApproximation,
    /// Exact area under the isoelastic curve between `p` and `p_ref`.
    IsoelasticIntegral,
}

/// Penalty weights and surplus method for the social-welfare objective.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WelfareSettings {
    /// Welfare lost per currency unit of fare
    #[serde(default = "default_equity_weight")]
    pub equity_weight: f64,
    /// Welfare lost per trip served
    #[serde(default = "default_environmental_weight")]
    pub environmental_weight: f64,
    #[serde(default)]
    pub surplus: SurplusModel,
}

fn default_equity_weight() -> f64 {
    0.3
}

fn default_environmental_weight() -> f64 {
    0.2
}

impl Default for WelfareSettings {
    fn default() -> Self {
        Self {
            equity_weight: default_equity_weight(),
            environmental_weight: default_environmental_weight(),
            surplus: SurplusModel::default(),
        }
    }
}

impl WelfareSettings {
    pub fn with_surplus(mut self, surplus: SurplusModel) -> Self {
        self.surplus = surplus;
        self
    }

    pub fn validate(&self) -> FareResult<()> {
        for (name, value) in [
            ("equity_weight", self.equity_weight),
            ("environmental_weight", self.environmental_weight),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(FareError::InvalidParameter(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Every economic quantity at one price, computed from a single demand
/// evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceOutcome {
    pub price: f64,
    pub demand: f64,
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
    pub consumer_surplus: f64,
    pub social_welfare: f64,
}

impl PriceOutcome {
    /// Scalar value of the given objective at this outcome.
    pub fn value(&self, kind: ObjectiveKind) -> f64 {
        match kind {
            ObjectiveKind::MaxRevenue => self.revenue,
            ObjectiveKind::MaxProfit => self.profit,
            ObjectiveKind::MaxBenefit => self.consumer_surplus,
            ObjectiveKind::MaxDemand => self.demand,
            ObjectiveKind::MaxSocialWelfare => self.social_welfare,
        }
    }
}

/// Objective functions for one mode over one price range.
#[derive(Debug, Clone, Copy)]
pub struct ObjectiveEvaluator<'a> {
    model: &'a FareModel,
    reference_price: f64,
    settings: WelfareSettings,
}

impl<'a> ObjectiveEvaluator<'a> {
    pub fn new(model: &'a FareModel, bounds: &PriceBounds, settings: WelfareSettings) -> Self {
        Self {
            model,
            reference_price: bounds.hi(),
            settings,
        }
    }

    pub fn model(&self) -> &FareModel {
        self.model
    }

    /// Upper price bound used as the surplus reference `p_ref`.
    pub fn reference_price(&self) -> f64 {
        self.reference_price
    }

    pub fn revenue(&self, price: f64) -> f64 {
        self.outcome_at(price).revenue
    }

    pub fn profit(&self, price: f64) -> f64 {
        self.outcome_at(price).profit
    }

    pub fn benefit(&self, price: f64) -> f64 {
        self.outcome_at(price).consumer_surplus
    }

    pub fn demand(&self, price: f64) -> f64 {
        self.model.demand(price)
    }

    pub fn social_welfare(&self, price: f64) -> f64 {
        self.outcome_at(price).social_welfare
    }

    pub fn evaluate(&self, kind: ObjectiveKind, price: f64) -> f64 {
        self.outcome_at(price).value(kind)
    }

    /// Compute all derived quantities at `price`.
    pub fn outcome_at(&self, price: f64) -> PriceOutcome {
        let demand = self.model.demand(price);
        let revenue = price * demand;
        let cost = self.model.cost(demand);
        let profit = revenue - cost;
        let consumer_surplus = self.consumer_surplus(price, demand);
        let social_welfare = consumer_surplus + profit
            - self.settings.equity_weight * price
            - self.settings.environmental_weight * demand;

        PriceOutcome {
            price,
            demand,
            revenue,
            cost,
            profit,
            consumer_surplus,
            social_welfare,
        }
    }

    fn consumer_surplus(&self, price: f64, demand: f64) -> f64 {
        match self.settings.surplus {
            SurplusModel::LinearApproximation => 0.5 * (self.reference_price - price) * demand,
            SurplusModel::IsoelasticIntegral => self
                .model
                .demand_curve()
                .surplus_between(price, self.reference_price),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fare_core::ModeEconomicProfile;

    fn bus_model() -> FareModel {
        let profile = ModeEconomicProfile::new("Bus", 40.0, 500.0, -0.5, 24.0).unwrap();
        FareModel::from_profile(&profile).unwrap()
    }

    #[test]
    fn test_objective_formulas_at_base_price() {
        let model = bus_model();
        let bounds = PriceBounds::new(20.0, 80.0).unwrap();
        let eval = ObjectiveEvaluator::new(&model, &bounds, WelfareSettings::default());

        let out = eval.outcome_at(40.0);
        assert!((out.demand - 500.0).abs() < 1e-9);
        assert!((out.revenue - 20_000.0).abs() < 1e-6);
        assert!((out.cost - 12_000.0).abs() < 1e-6);
        assert!((out.profit - 8_000.0).abs() < 1e-6);
        // ½·(80 − 40)·500
        assert!((out.consumer_surplus - 10_000.0).abs() < 1e-6);
        // 10000 + 8000 − 0.3·40 − 0.2·500
        assert!((out.social_welfare - 17_888.0).abs() < 1e-6);
    }

    #[test]
    fn test_evaluate_matches_outcome() {
        let model = bus_model();
        let bounds = PriceBounds::new(20.0, 80.0).unwrap();
        let eval = ObjectiveEvaluator::new(&model, &bounds, WelfareSettings::default());
        let out = eval.outcome_at(33.0);
        for kind in ObjectiveKind::ALL {
            assert_eq!(eval.evaluate(kind, 33.0), out.value(kind));
        }
        assert_eq!(eval.demand(33.0), out.demand);
    }

    #[test]
    fn test_benefit_is_zero_at_reference_price() {
        let model = bus_model();
        let bounds = PriceBounds::new(20.0, 80.0).unwrap();
        for surplus in [SurplusModel::LinearApproximation, SurplusModel::IsoelasticIntegral] {
            let eval = ObjectiveEvaluator::new(
                &model,
                &bounds,
                WelfareSettings::default().with_surplus(surplus),
            );
            assert_eq!(eval.benefit(80.0), 0.0);
        }
    }

    #[test]
    fn test_integral_surplus_exceeds_triangle_for_convex_demand() {
        let model = bus_model();
        let bounds = PriceBounds::new(20.0, 80.0).unwrap();
        let linear = ObjectiveEvaluator::new(&model, &bounds, WelfareSettings::default());
        let exact = ObjectiveEvaluator::new(
            &model,
            &bounds,
            WelfareSettings::default().with_surplus(SurplusModel::IsoelasticIntegral),
        );
        assert!(exact.benefit(40.0) > linear.benefit(40.0));
    }

    #[test]
    fn test_objective_kind_parsing() {
        assert_eq!("max_revenue".parse::<ObjectiveKind>().unwrap(), ObjectiveKind::MaxRevenue);
        assert_eq!("Max-S".parse::<ObjectiveKind>().unwrap(), ObjectiveKind::MaxSocialWelfare);
        assert_eq!("demand".parse::<ObjectiveKind>().unwrap(), ObjectiveKind::MaxDemand);
        assert!("max_happiness".parse::<ObjectiveKind>().is_err());
        for kind in ObjectiveKind::ALL {
            assert_eq!(kind.to_string().parse::<ObjectiveKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_welfare_settings_validation() {
        assert!(WelfareSettings::default().validate().is_ok());
        let bad = WelfareSettings {
            equity_weight: -0.1,
            ..WelfareSettings::default()
        };
        assert!(matches!(bad.validate(), Err(FareError::InvalidParameter(_))));
    }
}
