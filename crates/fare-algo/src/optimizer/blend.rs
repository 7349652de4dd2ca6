//! Weighted combination of the five objectives into one scalar.

use fare_core::{FareError, FareResult};
use serde::{Deserialize, Serialize};

use crate::objective::PriceOutcome;
use crate::mcda::WEIGHT_TOLERANCE;

/// Weights for `w_r·R + w_p·P + w_b·B + w_d·D + w_s·S`.
///
/// The terms are not normalized: revenue and welfare are in currency while
/// demand is in trips, so the weights trade off raw magnitudes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveBlend {
    #[serde(default)]
    pub revenue: f64,
    #[serde(default)]
    pub profit: f64,
    #[serde(default)]
    pub benefit: f64,
    #[serde(default)]
    pub demand: f64,
    #[serde(default)]
    pub welfare: f64,
}

impl Default for ObjectiveBlend {
    fn default() -> Self {
        Self {
            revenue: 0.2,
            profit: 0.2,
            benefit: 0.2,
            demand: 0.2,
            welfare: 0.2,
        }
    }
}

impl ObjectiveBlend {
    pub fn validate(&self) -> FareResult<()> {
        let weights = [
            self.revenue,
            self.profit,
            self.benefit,
            self.demand,
            self.welfare,
        ];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(FareError::InvalidWeights(
                "blend weights must be non-negative".into(),
            ));
        }
        let total: f64 = weights.iter().sum();
        if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(FareError::InvalidWeights(format!(
                "blend weights sum to {total}, expected 1.0"
            )));
        }
        Ok(())
    }

    pub fn value(&self, outcome: &PriceOutcome) -> f64 {
        self.revenue * outcome.revenue
            + self.profit * outcome.profit
            + self.benefit * outcome.consumer_surplus
            + self.demand * outcome.demand
            + self.welfare * outcome.social_welfare
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_blend_is_valid() {
        assert!(ObjectiveBlend::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_sums() {
        let blend = ObjectiveBlend {
            welfare: 0.3,
            ..ObjectiveBlend::default()
        };
        assert!(matches!(blend.validate(), Err(FareError::InvalidWeights(_))));
        let negative = ObjectiveBlend {
            revenue: -0.2,
            profit: 0.6,
            ..ObjectiveBlend::default()
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_value_weights_terms() {
        let outcome = PriceOutcome {
            price: 10.0,
            demand: 100.0,
            revenue: 1000.0,
            cost: 400.0,
            profit: 600.0,
            consumer_surplus: 200.0,
            social_welfare: 750.0,
        };
        let revenue_only = ObjectiveBlend {
            revenue: 1.0,
            profit: 0.0,
            benefit: 0.0,
            demand: 0.0,
            welfare: 0.0,
        };
        assert_eq!(revenue_only.value(&outcome), 1000.0);
        // 0.2·(1000 + 600 + 200 + 100 + 750)
        assert!((ObjectiveBlend::default().value(&outcome) - 530.0).abs() < 1e-9);
    }
}
