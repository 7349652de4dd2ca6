//! Distributional metrics over survey records.
//!
//! Records are loaded into a polars frame (see [`survey_frame`]) and every
//! metric is one lazy `group_by` over it. Groups are keyed by income bracket
//! or mode name and returned in `BTreeMap`s so output order is stable between
//! runs. Records missing the field a metric needs are left out of that metric
//! only.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::survey::{
    survey_frame, SurveyRecord, AFFORDABILITY_COLUMN, GENERALIZED_COST_COLUMN, INCOME_COLUMN,
    MODE_COLUMN, VALUE_OF_TIME_COLUMN, WTP_COLUMN,
};

/// Descriptive statistics of one sample. `std` is the sample (n − 1)
/// standard deviation, 0 for a single value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

/// Gini coefficient `Σ (2i − n − 1)·x₍ᵢ₎ / (n·Σx)` over ascending values.
///
/// 0 for empty input or a zero total.
pub fn gini_coefficient(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len() as f64;
    let total: f64 = sorted.iter().sum();
    if sorted.is_empty() || total == 0.0 {
        return 0.0;
    }
    let weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, x)| (2.0 * (i + 1) as f64 - n - 1.0) * x)
        .sum();
    weighted / (n * total)
}

fn summary_exprs(value: &str) -> Vec<Expr> {
    vec![
        col(value).count().cast(DataType::Int64).alias("count"),
        col(value).mean().alias("mean"),
        col(value).median().alias("median"),
        col(value).std(1).alias("std"),
        col(value).min().alias("min"),
        col(value).max().alias("max"),
    ]
}

/// Group rows with both `key` and `value` present and aggregate `value`.
fn grouped(frame: &DataFrame, key: &str, value: &str, aggs: Vec<Expr>) -> Result<DataFrame> {
    frame
        .clone()
        .lazy()
        .filter(col(key).is_not_null().and(col(value).is_not_null()))
        .group_by([col(key)])
        .agg(aggs)
        .collect()
        .with_context(|| format!("aggregating {value} by {key}"))
}

fn float_at(column: &Float64Chunked, idx: usize) -> f64 {
    column.get(idx).unwrap_or(f64::NAN)
}

/// Read the `summary_exprs` columns of an aggregated frame as
/// `(row, group, summary)`, one entry per group.
fn summary_rows(stats: &DataFrame, key: &str) -> Result<Vec<(usize, String, Summary)>> {
    let keys = stats.column(key)?.utf8()?;
    let count = stats.column("count")?.i64()?;
    let mean = stats.column("mean")?.f64()?;
    let median = stats.column("median")?.f64()?;
    let std = stats.column("std")?.f64()?;
    let min = stats.column("min")?.f64()?;
    let max = stats.column("max")?.f64()?;

    let mut rows = Vec::with_capacity(stats.height());
    for idx in 0..stats.height() {
        let Some(group) = keys.get(idx) else {
            continue;
        };
        rows.push((
            idx,
            group.to_string(),
            Summary {
                count: count.get(idx).unwrap_or(0) as usize,
                mean: float_at(mean, idx),
                median: float_at(median, idx),
                // null or NaN for a single value
                std: std.get(idx).filter(|s| s.is_finite()).unwrap_or(0.0),
                min: float_at(min, idx),
                max: float_at(max, idx),
            },
        ));
    }
    Ok(rows)
}

fn summaries(frame: &DataFrame, key: &str, value: &str) -> Result<BTreeMap<String, Summary>> {
    let stats = grouped(frame, key, value, summary_exprs(value))?;
    Ok(summary_rows(&stats, key)?
        .into_iter()
        .map(|(_, group, summary)| (group, summary))
        .collect())
}

/// Willingness-to-pay statistics per income bracket.
pub fn wtp_by_group(frame: &DataFrame) -> Result<BTreeMap<String, Summary>> {
    summaries(frame, INCOME_COLUMN, WTP_COLUMN)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffordabilitySummary {
    pub trips: usize,
    pub mean_ratio: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Trips with fare above willingness to pay
    pub unaffordable_trips: usize,
    pub unaffordable_percentage: f64,
}

/// Fare-to-WTP ratios per income bracket. Quartiles interpolate linearly.
pub fn affordability_by_group(
    frame: &DataFrame,
) -> Result<BTreeMap<String, AffordabilitySummary>> {
    let ratio = AFFORDABILITY_COLUMN;
    let mut aggs = summary_exprs(ratio);
    aggs.extend([
        col(ratio)
            .quantile(lit(0.25), QuantileInterpolOptions::Linear)
            .alias("q1"),
        col(ratio)
            .quantile(lit(0.75), QuantileInterpolOptions::Linear)
            .alias("q3"),
        col(ratio)
            .gt(lit(1.0))
            .cast(DataType::Int64)
            .sum()
            .alias("unaffordable"),
    ]);
    let stats = grouped(frame, INCOME_COLUMN, ratio, aggs)?;

    let q1 = stats.column("q1")?.f64()?;
    let q3 = stats.column("q3")?.f64()?;
    let unaffordable = stats.column("unaffordable")?.i64()?;

    let mut groups = BTreeMap::new();
    for (idx, group, summary) in summary_rows(&stats, INCOME_COLUMN)? {
        let unaffordable_trips = unaffordable.get(idx).unwrap_or(0) as usize;
        groups.insert(
            group,
            AffordabilitySummary {
                trips: summary.count,
                mean_ratio: summary.mean,
                q1: float_at(q1, idx),
                median: summary.median,
                q3: float_at(q3, idx),
                unaffordable_trips,
                unaffordable_percentage: 100.0 * unaffordable_trips as f64
                    / summary.count.max(1) as f64,
            },
        );
    }
    Ok(groups)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueOfTimeSummary {
    /// Currency per minute
    pub per_minute: Summary,
    /// Mean currency per hour
    pub per_hour: f64,
}

/// Value of time (WTP per trip minute) per income bracket.
pub fn value_of_time_by_group(
    frame: &DataFrame,
) -> Result<BTreeMap<String, ValueOfTimeSummary>> {
    Ok(summaries(frame, INCOME_COLUMN, VALUE_OF_TIME_COLUMN)?
        .into_iter()
        .map(|(group, per_minute)| {
            let per_hour = per_minute.mean * 60.0;
            (group, ValueOfTimeSummary { per_minute, per_hour })
        })
        .collect())
}

/// Gini coefficient of affordability ratios within each mode.
pub fn gini_by_mode(frame: &DataFrame) -> Result<BTreeMap<String, f64>> {
    let ratio = AFFORDABILITY_COLUMN;
    let stats = grouped(frame, MODE_COLUMN, ratio, vec![col(ratio).alias("ratios")])?;
    let modes = stats.column(MODE_COLUMN)?.utf8()?;
    let ratios = stats.column("ratios")?.list()?;

    let mut gini = BTreeMap::new();
    for (mode, values) in modes.into_iter().zip(ratios) {
        let (Some(mode), Some(values)) = (mode, values) else {
            continue;
        };
        let values: Vec<f64> = values.f64()?.into_no_null_iter().collect();
        gini.insert(mode.to_string(), gini_coefficient(&values));
    }
    Ok(gini)
}

/// Generalized trip cost statistics per mode.
pub fn generalized_cost_by_mode(frame: &DataFrame) -> Result<BTreeMap<String, Summary>> {
    summaries(frame, MODE_COLUMN, GENERALIZED_COST_COLUMN)
}

/// All equity metrics for one survey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityReport {
    pub wtp_by_income: BTreeMap<String, Summary>,
    pub affordability_by_income: BTreeMap<String, AffordabilitySummary>,
    pub value_of_time_by_income: BTreeMap<String, ValueOfTimeSummary>,
    pub gini_by_mode: BTreeMap<String, f64>,
    pub generalized_cost_by_mode: BTreeMap<String, Summary>,
}

impl EquityReport {
    pub fn from_records(records: &[SurveyRecord]) -> Result<Self> {
        let frame = survey_frame(records)?;
        Ok(Self {
            wtp_by_income: wtp_by_group(&frame)?,
            affordability_by_income: affordability_by_group(&frame)?,
            value_of_time_by_income: value_of_time_by_group(&frame)?,
            gini_by_mode: gini_by_mode(&frame)?,
            generalized_cost_by_mode: generalized_cost_by_mode(&frame)?,
        })
    }
}
