//! Operating cost of serving a number of trips.

use serde::{Deserialize, Serialize};

use crate::{FareError, FareResult};

/// Cost function `C(q)` for one mode.
///
/// Any variant must satisfy `C(0) = 0`, be non-negative and non-decreasing;
/// [`CostModel::validate`] checks this. Fixed costs have no representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CostModel {
    /// `C(q) = unit_cost · q`
    Linear { unit_cost: f64 },
    /// `C(q) = Σ coeffs[i] · q^(i+1)`, so `coeffs[0]` is the marginal cost at zero.
    Polynomial { coeffs: Vec<f64> },
    /// Piecewise linear `(trips, cost)` breakpoints starting at `(0, 0)`;
    /// the last segment's slope is extrapolated beyond the final breakpoint.
    PiecewiseLinear { points: Vec<(f64, f64)> },
}

impl CostModel {
    pub fn linear(unit_cost: f64) -> Self {
        CostModel::Linear { unit_cost }
    }

    /// `c1·q + c2·q²`
    pub fn quadratic(c1: f64, c2: f64) -> Self {
        CostModel::Polynomial {
            coeffs: vec![c1, c2],
        }
    }

    /// Check the `C(0) = 0`, non-negative, non-decreasing contract.
    pub fn validate(&self) -> FareResult<()> {
        match self {
            CostModel::Linear { unit_cost } => {
                if !unit_cost.is_finite() || *unit_cost < 0.0 {
                    return Err(FareError::InvalidParameter(format!(
                        "unit cost must be non-negative, got {unit_cost}"
                    )));
                }
            }
            CostModel::Polynomial { coeffs } => {
                if coeffs.iter().any(|c| !c.is_finite() || *c < 0.0) {
                    return Err(FareError::InvalidParameter(
                        "polynomial cost coefficients must be non-negative".into(),
                    ));
                }
            }
            CostModel::PiecewiseLinear { points } => {
                match points.first() {
                    Some(&(q, c)) if q == 0.0 && c == 0.0 => {}
                    _ => {
                        return Err(FareError::InvalidParameter(
                            "piecewise cost must start at (0, 0)".into(),
                        ))
                    }
                }
                for pair in points.windows(2) {
                    let (q0, c0) = pair[0];
                    let (q1, c1) = pair[1];
                    if !(q1 > q0) || !(c1 >= c0) || !q1.is_finite() || !c1.is_finite() {
                        return Err(FareError::InvalidParameter(format!(
                            "piecewise cost breakpoints must increase: ({q0}, {c0}) -> ({q1}, {c1})"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Cost of serving `trips` (negative input is treated as zero).
    pub fn evaluate(&self, trips: f64) -> f64 {
        let q = trips.max(0.0);
        match self {
            CostModel::Linear { unit_cost } => unit_cost * q,
            CostModel::Polynomial { coeffs } => coeffs
                .iter()
                .enumerate()
                .map(|(i, c)| c * q.powi(i as i32 + 1))
                .sum(),
            CostModel::PiecewiseLinear { points } => {
                if points.len() < 2 {
                    return 0.0;
                }
                for pair in points.windows(2) {
                    let (q0, c0) = pair[0];
                    let (q1, c1) = pair[1];
                    if q <= q1 {
                        let t = (q - q0) / (q1 - q0);
                        return c0 + t * (c1 - c0);
                    }
                }
                let n = points.len();
                let (q0, c0) = points[n - 2];
                let (q1, c1) = points[n - 1];
                c1 + (q - q1) * (c1 - c0) / (q1 - q0)
            }
        }
    }
}
