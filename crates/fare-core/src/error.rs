//! Unified error types for the fare workspace
//!
//! [`FareError`] covers structural violations detected by the optimization
//! core: invalid profiles, bounds or weights, unknown names and infeasible
//! constraints. File and parse failures belong to the outer crates, which
//! report them through `anyhow`. Numerical non-convergence is not an error:
//! it is reported through `OptimizationResult::converged`.
//!
//! # Example
//!
//! ```
//! use fare_core::{FareError, FareResult, PriceBounds};
//!
//! fn bounds_for(base_price: f64) -> FareResult<PriceBounds> {
//!     PriceBounds::around(base_price, 0.5, 2.0)
//! }
//!
//! assert!(bounds_for(40.0).is_ok());
//! assert!(matches!(bounds_for(-1.0), Err(FareError::InvalidBounds { .. })));
//! ```

use thiserror::Error;

/// Unified error type for all fare operations.
#[derive(Error, Debug)]
pub enum FareError {
    /// A mode profile violates its preconditions (non-positive base price,
    /// negative base demand, negative unit cost, non-finite values).
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    /// Price interval is empty, negative or non-finite
    #[error("Invalid price bounds [{lo}, {hi}]")]
    InvalidBounds { lo: f64, hi: f64 },

    /// Criterion or blend weights are negative or do not sum to one
    #[error("Invalid weights: {0}")]
    InvalidWeights(String),

    /// An optimizer or welfare setting is out of range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A parameter or objective name could not be recognised
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    /// Ranking needs a result that was never computed
    #[error("Missing {objective} result for mode '{mode}'")]
    MissingResult { mode: String, objective: String },

    /// No feasible price exists under the active constraints
    #[error("Infeasible: {0}")]
    Infeasible(String),
}

/// Convenience type alias for Results using FareError.
pub type FareResult<T> = Result<T, FareError>;
