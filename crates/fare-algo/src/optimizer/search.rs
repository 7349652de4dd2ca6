//! Bounded scalar maximization: coarse grid, then Brent refinement.
//!
//! A single local search started from the middle of the range silently
//! returns a local optimum whenever the objective is not unimodal, which is
//! the normal case for welfare objectives under inelastic demand
//! (|ε| ≤ 1). The grid pass locates the best basin; Brent's method
//! (argmin's `BrentOpt`) then polishes inside the bracket formed by the best
//! grid point's neighbours.

use argmin::core::{CostFunction, Executor, State, TerminationReason};
use argmin::solver::brent::BrentOpt;
use fare_core::{FareError, FareResult, PriceBounds};
use tracing::{debug, warn};

/// Tuning for [`maximize`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct SearchSettings {
    pub grid_points: usize,
    pub max_iterations: u64,
    pub tolerance: f64,
}

/// Where the search ended up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SearchOutcome {
    pub price: f64,
    pub converged: bool,
    pub iterations: u64,
}

/// Brent minimizes, so the objective is negated. Infeasible prices cost +∞.
struct NegatedObjective<'a, F> {
    objective: &'a F,
}

impl<F> CostFunction for NegatedObjective<'_, F>
where
    F: Fn(f64) -> Option<f64>,
{
    type Param = f64;
    type Output = f64;

    fn cost(&self, price: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
        Ok(match (self.objective)(*price) {
            Some(value) => -value,
            None => f64::INFINITY,
        })
    }
}

/// Uniform grid over `[lo, hi]` with both ends included exactly.
pub(crate) fn price_grid(bounds: &PriceBounds, points: usize) -> Vec<f64> {
    let n = points.max(3);
    let step = bounds.width() / (n - 1) as f64;
    (0..n)
        .map(|i| {
            if i == n - 1 {
                bounds.hi()
            } else {
                bounds.lo() + step * i as f64
            }
        })
        .collect()
}

/// Maximize `objective` over `bounds`.
///
/// `objective` returns `None` for infeasible prices (budget violations,
/// non-finite values). Fails only when no grid point is feasible.
pub(crate) fn maximize<F>(
    objective: F,
    bounds: &PriceBounds,
    settings: &SearchSettings,
) -> FareResult<SearchOutcome>
where
    F: Fn(f64) -> Option<f64>,
{
    if bounds.is_degenerate() {
        return match objective(bounds.lo()) {
            Some(_) => Ok(SearchOutcome {
                price: bounds.lo(),
                converged: true,
                iterations: 0,
            }),
            None => Err(FareError::Infeasible(format!(
                "price {} violates the active constraints",
                bounds.lo()
            ))),
        };
    }

    let grid = price_grid(bounds, settings.grid_points);
    let mut best: Option<(usize, f64)> = None;
    for (i, &price) in grid.iter().enumerate() {
        if let Some(value) = objective(price) {
            if best.map_or(true, |(_, best_value)| value > best_value) {
                best = Some((i, value));
            }
        }
    }
    let (best_idx, best_value) = best.ok_or_else(|| {
        FareError::Infeasible(format!(
            "no feasible price in [{}, {}]",
            bounds.lo(),
            bounds.hi()
        ))
    })?;
    let grid_best = grid[best_idx];

    let bracket_lo = grid[best_idx.saturating_sub(1)];
    let bracket_hi = grid[(best_idx + 1).min(grid.len() - 1)];
    debug!(grid_best, best_value, bracket_lo, bracket_hi, "grid pass complete");

    let fallback = |iterations: u64| SearchOutcome {
        price: grid_best,
        converged: false,
        iterations,
    };

    let problem = NegatedObjective {
        objective: &objective,
    };
    let solver = BrentOpt::new(bracket_lo, bracket_hi)
        .set_tolerance(f64::EPSILON.sqrt(), settings.tolerance);
    let run = Executor::new(problem, solver)
        .configure(|state| state.max_iters(settings.max_iterations))
        .run();

    let result = match run {
        Ok(result) => result,
        Err(err) => {
            warn!(%err, grid_best, "local refinement failed; using best grid point");
            return Ok(fallback(0));
        }
    };

    let state = result.state();
    let iterations = state.get_iter();
    let converged = matches!(
        state.get_termination_reason(),
        Some(TerminationReason::SolverConverged)
    );
    let refined = state.get_best_param().copied();

    let in_bracket = |price: f64| price.is_finite() && price >= bracket_lo && price <= bracket_hi;
    match refined {
        Some(price) if converged && in_bracket(price) => {
            let price = bounds.clamp(price);
            match objective(price) {
                Some(value) if value > best_value => Ok(SearchOutcome {
                    price,
                    converged: true,
                    iterations,
                }),
                _ => Ok(SearchOutcome {
                    price: grid_best,
                    converged: true,
                    iterations,
                }),
            }
        }
        _ => {
            warn!(
                grid_best,
                iterations, "local refinement did not converge; using best grid point"
            );
            Ok(fallback(iterations))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> SearchSettings {
        SearchSettings {
            grid_points: 51,
            max_iterations: 100,
            tolerance: 1e-10,
        }
    }

    #[test]
    fn test_grid_includes_endpoints() {
        let bounds = PriceBounds::new(20.0, 80.0).unwrap();
        let grid = price_grid(&bounds, 7);
        assert_eq!(grid.len(), 7);
        assert_eq!(grid[0], 20.0);
        assert_eq!(grid[6], 80.0);
        assert!((grid[3] - 50.0).abs() < 1e-12);
        assert_eq!(price_grid(&bounds, 1).len(), 3);
    }

    #[test]
    fn test_finds_interior_maximum() {
        let bounds = PriceBounds::new(0.0, 10.0).unwrap();
        let out = maximize(|x| Some(-(x - 3.3) * (x - 3.3)), &bounds, &settings()).unwrap();
        assert!(out.converged);
        assert!((out.price - 3.3).abs() < 1e-6, "got {}", out.price);
    }

    #[test]
    fn test_finds_global_maximum_of_bimodal_function() {
        // Local peak at 2 (height 1), global peak at 8 (height 2).
        let f = |x: f64| Some((-(x - 2.0).powi(2)).exp() + 2.0 * (-(x - 8.0).powi(2)).exp());
        let bounds = PriceBounds::new(0.0, 10.0).unwrap();
        let out = maximize(f, &bounds, &settings()).unwrap();
        assert!((out.price - 8.0).abs() < 1e-4, "got {}", out.price);
    }

    #[test]
    fn test_boundary_maximum() {
        let bounds = PriceBounds::new(1.0, 5.0).unwrap();
        let out = maximize(|x| Some(x), &bounds, &settings()).unwrap();
        assert!((out.price - 5.0).abs() < 1e-6);
        assert!(bounds.contains(out.price));
    }

    #[test]
    fn test_degenerate_bounds() {
        let bounds = PriceBounds::new(50.0, 50.0).unwrap();
        let out = maximize(|x| Some(x), &bounds, &settings()).unwrap();
        assert_eq!(out.price, 50.0);
        assert!(out.converged);
        assert_eq!(out.iterations, 0);
    }

    #[test]
    fn test_infeasible_everywhere() {
        let bounds = PriceBounds::new(1.0, 5.0).unwrap();
        let err = maximize(|_| None, &bounds, &settings()).unwrap_err();
        assert!(matches!(err, FareError::Infeasible(_)));
    }

    #[test]
    fn test_partially_feasible() {
        // Increasing objective but prices above 3 are infeasible.
        let bounds = PriceBounds::new(0.0, 10.0).unwrap();
        let out = maximize(|x| if x <= 3.0 { Some(x) } else { None }, &bounds, &settings())
            .unwrap();
        assert!(out.price <= 3.0);
        assert!(out.price > 2.7);
    }
}
