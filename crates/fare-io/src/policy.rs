//! Income-targeted fare subsidy evaluation.
//!
//! A policy discounts the fare of currently unaffordable trips (fare above
//! WTP) by a rate that depends on the traveller's income bracket. Its cost is
//! the total discount granted; its benefit is the number of trips that become
//! affordable.

use std::collections::BTreeMap;

use fare_core::{FareError, FareResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::survey::SurveyRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsidyPolicy {
    pub name: String,
    /// Fare discount fraction per income bracket; brackets not listed get none.
    pub rates: BTreeMap<String, f64>,
}

impl SubsidyPolicy {
    pub fn new(name: impl Into<String>, rates: &[(&str, f64)]) -> Self {
        Self {
            name: name.into(),
            rates: rates
                .iter()
                .map(|(bracket, rate)| (bracket.to_string(), *rate))
                .collect(),
        }
    }

    pub fn validate(&self) -> FareResult<()> {
        for (bracket, rate) in &self.rates {
            if !rate.is_finite() || !(0.0..=1.0).contains(rate) {
                return Err(FareError::InvalidParameter(format!(
                    "policy '{}': rate for {bracket} must be in [0, 1], got {rate}",
                    self.name
                )));
            }
        }
        Ok(())
    }

    /// Bracket names match case-insensitively.
    pub fn rate_for(&self, bracket: &str) -> f64 {
        self.rates
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(bracket))
            .map(|(_, rate)| *rate)
            .unwrap_or(0.0)
    }
}

/// Current (none), progressive, universal, targeted and environmental.
pub fn default_policies() -> Vec<SubsidyPolicy> {
    vec![
        SubsidyPolicy::new("current", &[("Low", 0.0), ("Mid", 0.0), ("High", 0.0)]),
        SubsidyPolicy::new("progressive", &[("Low", 0.4), ("Mid", 0.2), ("High", 0.0)]),
        SubsidyPolicy::new("universal", &[("Low", 0.2), ("Mid", 0.2), ("High", 0.2)]),
        SubsidyPolicy::new("targeted", &[("Low", 0.5), ("Mid", 0.1), ("High", 0.0)]),
        SubsidyPolicy::new("environmental", &[("Low", 0.3), ("Mid", 0.15), ("High", 0.05)]),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyOutcome {
    pub policy: String,
    pub total_subsidy_cost: f64,
    /// Trips moved from unaffordable to affordable
    pub accessibility_improvement: usize,
    /// Trips made affordable per currency unit spent, 0 when nothing is spent
    pub cost_effectiveness: f64,
}

/// Evaluate every policy against the survey, in the order given.
pub fn evaluate_subsidy_policies(
    records: &[SurveyRecord],
    policies: &[SubsidyPolicy],
) -> FareResult<Vec<PolicyOutcome>> {
    policies
        .iter()
        .map(|policy| {
            policy.validate()?;
            let mut cost = 0.0;
            let mut improved = 0;
            for record in records {
                let (Some(wtp), Some(bracket)) = (
                    record.wtp.filter(|w| *w > 0.0),
                    record.income_bracket.as_deref(),
                ) else {
                    continue;
                };
                if record.fare_paid / wtp <= 1.0 {
                    continue;
                }
                let subsidy = record.fare_paid * policy.rate_for(bracket);
                cost += subsidy;
                if (record.fare_paid - subsidy) / wtp <= 1.0 {
                    improved += 1;
                }
            }
            let outcome = PolicyOutcome {
                policy: policy.name.clone(),
                total_subsidy_cost: cost,
                accessibility_improvement: improved,
                cost_effectiveness: if cost > 0.0 { improved as f64 / cost } else { 0.0 },
            };
            debug!(
                policy = %outcome.policy,
                cost = outcome.total_subsidy_cost,
                improved = outcome.accessibility_improvement,
                "subsidy policy evaluated"
            );
            Ok(outcome)
        })
        .collect()
}
