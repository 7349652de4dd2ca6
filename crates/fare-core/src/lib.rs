//! # fare-core: Transport Fare Modeling Core
//!
//! Value objects and curves shared by the fare-optimization workspace.
//!
//! ## Quick Start
//!
//! ```rust
//! use fare_core::*;
//!
//! let bus = ModeEconomicProfile::new("Bus", 40.0, 500.0, -0.5, 24.0)?;
//! let bounds = PriceBounds::around(bus.base_price(), 0.5, 2.0)?;
//! let model = FareModel::from_profile(&bus)?;
//!
//! assert_eq!(bounds.hi(), 80.0);
//! assert!(model.demand(30.0) > model.demand(40.0));
//! # Ok::<(), FareError>(())
//! ```
//!
//! ## Core Data Structures
//!
//! - [`ModeEconomicProfile`] - validated per-mode inputs (price, demand, elasticity, cost)
//! - [`PriceBounds`] - closed feasible price interval
//! - [`DemandCurve`] - isoelastic demand `D(p) = D0·(p/p0)^ε`
//! - [`CostModel`] - operating cost `C(q)` with `C(0) = 0`
//! - [`FareModel`] - one mode's demand and cost curves
//! - [`FareError`] - unified error type

pub mod cost;
pub mod demand;
pub mod diagnostics;
pub mod error;
pub mod model;
pub mod profile;

pub use cost::CostModel;
pub use demand::DemandCurve;
pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::{FareError, FareResult};
pub use model::FareModel;
pub use profile::{ModeEconomicProfile, PriceBounds, CONVENTIONAL_ELASTICITY};
