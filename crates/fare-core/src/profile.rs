//! Per-mode economic inputs and feasible price intervals.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{FareError, FareResult};

/// Conventional magnitude range for price elasticity of transit demand.
pub const CONVENTIONAL_ELASTICITY: (f64, f64) = (0.2, 2.0);

/// Economic description of one transport mode for one analysis run.
///
/// Built from survey aggregates (mean fare, trip count) plus an estimated or
/// assumed elasticity and operating cost. Fields are private so a profile can
/// only exist in a validated state; use [`ModeEconomicProfile::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawProfile")]
pub struct ModeEconomicProfile {
    name: String,
    base_price: f64,
    base_demand: f64,
    price_elasticity: f64,
    unit_cost: f64,
}

#[derive(Deserialize)]
struct RawProfile {
    name: String,
    base_price: f64,
    base_demand: f64,
    price_elasticity: f64,
    unit_cost: f64,
}

impl TryFrom<RawProfile> for ModeEconomicProfile {
    type Error = FareError;

    fn try_from(raw: RawProfile) -> FareResult<Self> {
        ModeEconomicProfile::new(
            raw.name,
            raw.base_price,
            raw.base_demand,
            raw.price_elasticity,
            raw.unit_cost,
        )
    }
}

impl ModeEconomicProfile {
    /// Validate and build a profile.
    ///
    /// Fails with [`FareError::InvalidProfile`] when `base_price <= 0`,
    /// `base_demand < 0`, `unit_cost < 0`, or any value is non-finite.
    pub fn new(
        name: impl Into<String>,
        base_price: f64,
        base_demand: f64,
        price_elasticity: f64,
        unit_cost: f64,
    ) -> FareResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(FareError::InvalidProfile("mode name cannot be empty".into()));
        }
        if !base_price.is_finite() || base_price <= 0.0 {
            return Err(FareError::InvalidProfile(format!(
                "{name}: base_price must be positive, got {base_price}"
            )));
        }
        if !base_demand.is_finite() || base_demand < 0.0 {
            return Err(FareError::InvalidProfile(format!(
                "{name}: base_demand must be non-negative, got {base_demand}"
            )));
        }
        if !price_elasticity.is_finite() {
            return Err(FareError::InvalidProfile(format!(
                "{name}: price_elasticity must be finite, got {price_elasticity}"
            )));
        }
        if !unit_cost.is_finite() || unit_cost < 0.0 {
            return Err(FareError::InvalidProfile(format!(
                "{name}: unit_cost must be non-negative, got {unit_cost}"
            )));
        }

        let magnitude = price_elasticity.abs();
        if price_elasticity > 0.0
            || magnitude < CONVENTIONAL_ELASTICITY.0
            || magnitude > CONVENTIONAL_ELASTICITY.1
        {
            warn!(
                mode = %name,
                price_elasticity,
                "elasticity outside the conventional [-2.0, -0.2] range"
            );
        }

        Ok(Self {
            name,
            base_price,
            base_demand,
            price_elasticity,
            unit_cost,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Observed mean fare (currency per trip)
    pub fn base_price(&self) -> f64 {
        self.base_price
    }

    /// Observed trips at `base_price`
    pub fn base_demand(&self) -> f64 {
        self.base_demand
    }

    pub fn price_elasticity(&self) -> f64 {
        self.price_elasticity
    }

    /// Operating cost per trip
    pub fn unit_cost(&self) -> f64 {
        self.unit_cost
    }

    /// Copy of this profile with a different base price (re-validated).
    pub fn with_base_price(&self, base_price: f64) -> FareResult<Self> {
        Self::new(
            self.name.clone(),
            base_price,
            self.base_demand,
            self.price_elasticity,
            self.unit_cost,
        )
    }

    pub fn with_base_demand(&self, base_demand: f64) -> FareResult<Self> {
        Self::new(
            self.name.clone(),
            self.base_price,
            base_demand,
            self.price_elasticity,
            self.unit_cost,
        )
    }

    pub fn with_price_elasticity(&self, price_elasticity: f64) -> FareResult<Self> {
        Self::new(
            self.name.clone(),
            self.base_price,
            self.base_demand,
            price_elasticity,
            self.unit_cost,
        )
    }

    pub fn with_unit_cost(&self, unit_cost: f64) -> FareResult<Self> {
        Self::new(
            self.name.clone(),
            self.base_price,
            self.base_demand,
            self.price_elasticity,
            unit_cost,
        )
    }
}

/// Closed interval `[lo, hi]` of feasible prices, `0 <= lo <= hi`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBounds")]
pub struct PriceBounds {
    lo: f64,
    hi: f64,
}

#[derive(Deserialize)]
struct RawBounds {
    lo: f64,
    hi: f64,
}

impl TryFrom<RawBounds> for PriceBounds {
    type Error = FareError;

    fn try_from(raw: RawBounds) -> FareResult<Self> {
        PriceBounds::new(raw.lo, raw.hi)
    }
}

impl PriceBounds {
    pub fn new(lo: f64, hi: f64) -> FareResult<Self> {
        if !lo.is_finite() || !hi.is_finite() || lo < 0.0 || lo > hi {
            return Err(FareError::InvalidBounds { lo, hi });
        }
        Ok(Self { lo, hi })
    }

    /// Interval scaled around a reference price, e.g. `around(p0, 0.5, 2.0)`
    /// gives `[p0/2, 2·p0]`.
    pub fn around(price: f64, lower_multiplier: f64, upper_multiplier: f64) -> FareResult<Self> {
        Self::new(price * lower_multiplier, price * upper_multiplier)
    }

    pub fn lo(&self) -> f64 {
        self.lo
    }

    pub fn hi(&self) -> f64 {
        self.hi
    }

    pub fn width(&self) -> f64 {
        self.hi - self.lo
    }

    pub fn is_degenerate(&self) -> bool {
        self.lo == self.hi
    }

    pub fn contains(&self, price: f64) -> bool {
        price >= self.lo && price <= self.hi
    }

    /// Clamp a price into the interval.
    pub fn clamp(&self, price: f64) -> f64 {
        price.clamp(self.lo, self.hi)
    }
}
