//! Isoelastic demand curve `D(p) = D0 · (p / p0)^ε`.

use serde::{Deserialize, Serialize};

use crate::{FareError, FareResult};

/// Constant-elasticity demand curve anchored at an observed `(p0, D0)` point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemandCurve {
    base_demand: f64,
    base_price: f64,
    elasticity: f64,
}

impl DemandCurve {
    /// Build a curve through `(base_price, base_demand)` with constant elasticity.
    ///
    /// `base_price` must be strictly positive; the curve is undefined otherwise.
    pub fn isoelastic(base_demand: f64, base_price: f64, elasticity: f64) -> FareResult<Self> {
        if !base_price.is_finite() || base_price <= 0.0 {
            return Err(FareError::InvalidProfile(format!(
                "demand curve needs a positive base price, got {base_price}"
            )));
        }
        if !base_demand.is_finite() || base_demand < 0.0 {
            return Err(FareError::InvalidProfile(format!(
                "demand curve needs a non-negative base demand, got {base_demand}"
            )));
        }
        if !elasticity.is_finite() {
            return Err(FareError::InvalidProfile(format!(
                "demand curve needs a finite elasticity, got {elasticity}"
            )));
        }
        Ok(Self {
            base_demand,
            base_price,
            elasticity,
        })
    }

    pub fn base_demand(&self) -> f64 {
        self.base_demand
    }

    pub fn base_price(&self) -> f64 {
        self.base_price
    }

    pub fn elasticity(&self) -> f64 {
        self.elasticity
    }

    /// Trips demanded at `price`.
    ///
    /// Clamped to `>= 0`; NaN and infinite values (e.g. `p = 0` with negative
    /// elasticity) collapse to zero ridership.
    pub fn quantity(&self, price: f64) -> f64 {
        let q = self.base_demand * (price / self.base_price).powf(self.elasticity);
        clamp_non_negative(q)
    }

    /// Exact consumer surplus between `price` and `reference_price`:
    /// `∫_p^{p_ref} D(x) dx`.
    ///
    /// Returns zero when `price >= reference_price`.
    pub fn surplus_between(&self, price: f64, reference_price: f64) -> f64 {
        if price >= reference_price {
            return 0.0;
        }
        let scale = self.base_demand / self.base_price.powf(self.elasticity);
        let exponent = self.elasticity + 1.0;
        let integral = if exponent.abs() < 1e-12 {
            scale * (reference_price / price).ln()
        } else {
            scale * (reference_price.powf(exponent) - price.powf(exponent)) / exponent
        };
        clamp_non_negative(integral)
    }
}

fn clamp_non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bus() -> DemandCurve {
        DemandCurve::isoelastic(500.0, 40.0, -0.5).unwrap()
    }

    #[test]
    fn test_quantity_at_base_price() {
        assert!((bus().quantity(40.0) - 500.0).abs() < 1e-12);
    }

    #[test]
    fn test_quantity_is_monotone_for_negative_elasticity() {
        let curve = bus();
        assert!(curve.quantity(20.0) > curve.quantity(40.0));
        assert!(curve.quantity(80.0) < curve.quantity(40.0));
        // 500 * (80/40)^-0.5
        assert!((curve.quantity(80.0) - 500.0 / 2f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_zero_price_clamps_to_zero() {
        assert_eq!(bus().quantity(0.0), 0.0);
    }

    #[test]
    fn test_rejects_zero_base_price() {
        let err = DemandCurve::isoelastic(500.0, 0.0, -0.5).unwrap_err();
        assert!(matches!(err, FareError::InvalidProfile(_)));
    }

    #[test]
    fn test_surplus_integral_matches_closed_form() {
        // ∫_20^80 500·sqrt(40/x) dx = 500·sqrt(40)·2·(sqrt(80) − sqrt(20))
        let expected = 500.0 * 40f64.sqrt() * 2.0 * (80f64.sqrt() - 20f64.sqrt());
        assert!((bus().surplus_between(20.0, 80.0) - expected).abs() < 1e-6);
        assert_eq!(bus().surplus_between(80.0, 80.0), 0.0);
        assert_eq!(bus().surplus_between(90.0, 80.0), 0.0);
    }

    #[test]
    fn test_surplus_unit_elasticity_uses_log() {
        let curve = DemandCurve::isoelastic(100.0, 10.0, -1.0).unwrap();
        let expected = 100.0 * 10.0 * (20f64 / 5.0).ln();
        assert!((curve.surplus_between(5.0, 20.0) - expected).abs() < 1e-9);
    }
}
