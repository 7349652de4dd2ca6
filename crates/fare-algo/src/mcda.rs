//! Multi-criteria ranking of transport modes.
//!
//! Each criterion reads one scalar per mode from that mode's optimization
//! results, divides it by the best value across modes, and contributes
//! `weight × normalized` to the mode's composite score.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use fare_core::{FareError, FareResult, ModeEconomicProfile};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::objective::ObjectiveKind;
use crate::optimizer::{ModeResults, OptimizationResult};

/// Allowed deviation of a weight vector's sum from 1.0.
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Scalar dimension a criterion scores modes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionMetric {
    SocialWelfare,
    Revenue,
    Profit,
    Demand,
    ConsumerSurplus,
    /// Relative fare reduction of the welfare-optimal price below the base fare
    Equity,
}

impl CriterionMetric {
    /// Objective whose result the metric is read from.
    pub fn source(&self) -> ObjectiveKind {
        match self {
            CriterionMetric::SocialWelfare | CriterionMetric::Equity => {
                ObjectiveKind::MaxSocialWelfare
            }
            CriterionMetric::Revenue => ObjectiveKind::MaxRevenue,
            CriterionMetric::Profit => ObjectiveKind::MaxProfit,
            CriterionMetric::Demand => ObjectiveKind::MaxDemand,
            CriterionMetric::ConsumerSurplus => ObjectiveKind::MaxBenefit,
        }
    }

    /// Raw (unnormalized) metric value for one mode.
    pub fn extract(&self, profile: &ModeEconomicProfile, result: &OptimizationResult) -> f64 {
        match self {
            CriterionMetric::SocialWelfare => result.social_welfare,
            CriterionMetric::Revenue => result.revenue,
            CriterionMetric::Profit => result.profit,
            CriterionMetric::Demand => result.demand_at_optimum,
            CriterionMetric::ConsumerSurplus => result.consumer_surplus,
            CriterionMetric::Equity => {
                let base = profile.base_price();
                ((base - result.optimal_price) / base).max(0.0)
            }
        }
    }
}

impl fmt::Display for CriterionMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CriterionMetric::SocialWelfare => "social_welfare",
            CriterionMetric::Revenue => "revenue",
            CriterionMetric::Profit => "profit",
            CriterionMetric::Demand => "demand",
            CriterionMetric::ConsumerSurplus => "consumer_surplus",
            CriterionMetric::Equity => "equity",
        };
        f.write_str(name)
    }
}

impl FromStr for CriterionMetric {
    type Err = FareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "social_welfare" | "welfare" => Ok(CriterionMetric::SocialWelfare),
            "revenue" => Ok(CriterionMetric::Revenue),
            "profit" => Ok(CriterionMetric::Profit),
            "demand" | "ridership" => Ok(CriterionMetric::Demand),
            "consumer_surplus" | "benefit" => Ok(CriterionMetric::ConsumerSurplus),
            "equity" => Ok(CriterionMetric::Equity),
            _ => Err(FareError::UnknownParameter(format!("criterion '{}'", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct McdaCriterion {
    pub metric: CriterionMetric,
    pub weight: f64,
}

impl McdaCriterion {
    pub fn new(metric: CriterionMetric, weight: f64) -> Self {
        Self { metric, weight }
    }
}

/// Welfare 0.4, revenue 0.2, profit 0.2, demand 0.1, equity 0.1.
pub fn default_criteria() -> Vec<McdaCriterion> {
    vec![
        McdaCriterion::new(CriterionMetric::SocialWelfare, 0.4),
        McdaCriterion::new(CriterionMetric::Revenue, 0.2),
        McdaCriterion::new(CriterionMetric::Profit, 0.2),
        McdaCriterion::new(CriterionMetric::Demand, 0.1),
        McdaCriterion::new(CriterionMetric::Equity, 0.1),
    ]
}

/// Weights must be non-negative, finite and sum to 1 within [`WEIGHT_TOLERANCE`].
pub fn validate_weights(criteria: &[McdaCriterion]) -> FareResult<()> {
    if criteria.is_empty() {
        return Err(FareError::InvalidWeights("no criteria given".into()));
    }
    if let Some(bad) = criteria
        .iter()
        .find(|c| !c.weight.is_finite() || c.weight < 0.0)
    {
        return Err(FareError::InvalidWeights(format!(
            "weight for {} must be non-negative, got {}",
            bad.metric, bad.weight
        )));
    }
    let total: f64 = criteria.iter().map(|c| c.weight).sum();
    if (total - 1.0).abs() > WEIGHT_TOLERANCE {
        return Err(FareError::InvalidWeights(format!(
            "weights sum to {total}, expected 1.0"
        )));
    }
    Ok(())
}

/// MCDA outcome for one mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeRanking {
    pub mode: String,
    /// 1-based position, 1 is best
    pub rank: usize,
    pub per_criterion_normalized_score: BTreeMap<CriterionMetric, f64>,
    pub weighted_score: f64,
}

fn lookup<'a>(
    results: &'a HashMap<String, ModeResults>,
    mode: &str,
    objective: ObjectiveKind,
) -> FareResult<&'a OptimizationResult> {
    results
        .get(mode)
        .and_then(|by_objective| by_objective.get(&objective))
        .ok_or_else(|| FareError::MissingResult {
            mode: mode.to_string(),
            objective: objective.to_string(),
        })
}

/// Rank `modes` by weighted normalized criteria.
///
/// Output is sorted by descending `weighted_score`; equal scores keep the
/// order of `modes`.
pub fn rank(
    modes: &[ModeEconomicProfile],
    results: &HashMap<String, ModeResults>,
    criteria: &[McdaCriterion],
) -> FareResult<Vec<ModeRanking>> {
    validate_weights(criteria)?;

    // raw[c][m]: metric c for mode m
    let mut raw = Vec::with_capacity(criteria.len());
    for criterion in criteria {
        let values = modes
            .iter()
            .map(|profile| {
                let result = lookup(results, profile.name(), criterion.metric.source())?;
                Ok(criterion.metric.extract(profile, result))
            })
            .collect::<FareResult<Vec<f64>>>()?;
        raw.push(values);
    }

    let normalized: Vec<Vec<f64>> = raw
        .iter()
        .map(|values| {
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            values
                .iter()
                .map(|v| {
                    if max > 0.0 && max.is_finite() {
                        (v / max).clamp(0.0, 1.0)
                    } else {
                        0.0
                    }
                })
                .collect()
        })
        .collect();

    let mut rankings: Vec<ModeRanking> = modes
        .iter()
        .enumerate()
        .map(|(m, profile)| {
            let mut scores = BTreeMap::new();
            let mut weighted_score = 0.0;
            for (c, criterion) in criteria.iter().enumerate() {
                let score = normalized[c][m];
                weighted_score += criterion.weight * score;
                // Repeated metrics keep the last score.
                scores.insert(criterion.metric, score);
            }
            ModeRanking {
                mode: profile.name().to_string(),
                rank: 0,
                per_criterion_normalized_score: scores,
                weighted_score,
            }
        })
        .collect();

    rankings.sort_by(|a, b| b.weighted_score.total_cmp(&a.weighted_score));
    for (i, ranking) in rankings.iter_mut().enumerate() {
        ranking.rank = i + 1;
        debug!(
            mode = %ranking.mode,
            rank = ranking.rank,
            score = ranking.weighted_score,
            "mode ranked"
        );
    }
    Ok(rankings)
}
