//! # fare-algo: Fare optimization and mode ranking
//!
//! Optimal transit fares under five economic objectives, a weighted
//! multi-criteria ranking across modes, and one-parameter sensitivity sweeps.
//!
//! ## Objectives
//!
//! | Kind | Code | Maximizes |
//! |------|------|-----------|
//! | [`ObjectiveKind::MaxRevenue`] | Max-R | `p·D(p)` |
//! | [`ObjectiveKind::MaxProfit`] | Max-P | `p·D(p) − C(D(p))` |
//! | [`ObjectiveKind::MaxBenefit`] | Max-B | consumer surplus |
//! | [`ObjectiveKind::MaxDemand`] | Max-D | ridership `D(p)` |
//! | [`ObjectiveKind::MaxSocialWelfare`] | Max-S | surplus + profit − equity, environment terms |
//!
//! ## Pipeline
//!
//! - [`FareOptimizer`]: grid search plus Brent refinement over a price interval
//! - [`FareOptimizer::optimize_modes`]: all objectives for all modes (rayon with `parallel`)
//! - [`mcda::rank`]: normalized weighted-sum ranking of modes
//! - [`FareOptimizer::sweep`]: re-optimize while varying one profile parameter
//! - [`FareOptimizer::optimize_blend`]: single fare for a weighted objective mix
//!
//! ## Example
//!
//! ```
//! use fare_algo::{FareOptimizer, ObjectiveKind};
//! use fare_core::{ModeEconomicProfile, PriceBounds};
//!
//! let bus = ModeEconomicProfile::new("Bus", 40.0, 500.0, -0.5, 24.0)?;
//! let bounds = PriceBounds::around(bus.base_price(), 0.5, 2.0)?;
//!
//! let result = FareOptimizer::new().optimize(ObjectiveKind::MaxRevenue, &bus, &bounds)?;
//! assert!(bounds.contains(result.optimal_price));
//! # Ok::<(), fare_core::FareError>(())
//! ```

pub mod batch;
pub mod mcda;
pub mod objective;
pub mod optimizer;
pub mod sensitivity;

pub use batch::{results_by_mode, ModeJob, ModePlan};
pub use mcda::{
    default_criteria, rank, validate_weights, CriterionMetric, McdaCriterion, ModeRanking,
    WEIGHT_TOLERANCE,
};
pub use objective::{
    ObjectiveEvaluator, ObjectiveKind, PriceOutcome, SurplusModel, WelfareSettings,
};
pub use optimizer::{
    optimize, BlendResult, FareOptimizer, ModeResults, ObjectiveBlend, OptimizationResult,
};
pub use sensitivity::{sweep, sweep_welfare, SweepParameter, SweepPoint};
