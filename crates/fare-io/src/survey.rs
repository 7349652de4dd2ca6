//! Stated-preference survey loading and per-mode aggregation.
//!
//! **Expected CSV format:** header row with at least `Mode_Used` and
//! `Fare_Paid`; `WTP`, `Income_Bracket`, `Travel_Time` and `Wait_Time` are
//! read when present. Other columns are ignored.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use fare_core::{Diagnostics, ModeEconomicProfile};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Wait minutes count this much more than in-vehicle minutes.
pub const WAIT_TIME_PENALTY: f64 = 1.5;

pub const MODE_COLUMN: &str = "mode";
pub const INCOME_COLUMN: &str = "income_bracket";
pub const FARE_COLUMN: &str = "fare_paid";
pub const WTP_COLUMN: &str = "wtp";
pub const AFFORDABILITY_COLUMN: &str = "affordability_ratio";
pub const VALUE_OF_TIME_COLUMN: &str = "value_of_time";
pub const GENERALIZED_COST_COLUMN: &str = "generalized_cost";

#[derive(Debug, Deserialize)]
struct SurveyRow {
    #[serde(rename = "Mode_Used", default)]
    mode: Option<String>,
    #[serde(rename = "Fare_Paid", default, deserialize_with = "csv::invalid_option")]
    fare_paid: Option<f64>,
    #[serde(rename = "WTP", default, deserialize_with = "csv::invalid_option")]
    wtp: Option<f64>,
    #[serde(rename = "Income_Bracket", default)]
    income_bracket: Option<String>,
    #[serde(rename = "Travel_Time", default, deserialize_with = "csv::invalid_option")]
    travel_time: Option<f64>,
    #[serde(rename = "Wait_Time", default, deserialize_with = "csv::invalid_option")]
    wait_time: Option<f64>,
}

/// One respondent's trip. Money in local currency, times in minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyRecord {
    pub mode: String,
    pub fare_paid: f64,
    pub wtp: Option<f64>,
    pub income_bracket: Option<String>,
    pub travel_time: Option<f64>,
    pub wait_time: Option<f64>,
}

impl SurveyRecord {
    pub fn new(mode: impl Into<String>, fare_paid: f64) -> Self {
        Self {
            mode: mode.into(),
            fare_paid,
            wtp: None,
            income_bracket: None,
            travel_time: None,
            wait_time: None,
        }
    }

    pub fn with_wtp(mut self, wtp: f64) -> Self {
        self.wtp = Some(wtp);
        self
    }

    pub fn with_income(mut self, bracket: impl Into<String>) -> Self {
        self.income_bracket = Some(bracket.into());
        self
    }

    pub fn with_times(mut self, travel: f64, wait: f64) -> Self {
        self.travel_time = Some(travel);
        self.wait_time = Some(wait);
        self
    }

    /// Travel plus wait minutes
    pub fn total_time(&self) -> Option<f64> {
        Some(self.travel_time? + self.wait_time?)
    }

    /// Fare divided by willingness to pay; above 1 the trip is unaffordable.
    pub fn affordability_ratio(&self) -> Option<f64> {
        let wtp = self.wtp.filter(|w| *w > 0.0)?;
        Some(self.fare_paid / wtp)
    }

    /// Willingness to pay per minute of total trip time.
    pub fn value_of_time(&self) -> Option<f64> {
        let wtp = self.wtp?;
        let total = self.total_time().filter(|t| *t > 0.0)?;
        Some(wtp / total)
    }

    /// `fare + VOT·travel + 1.5·VOT·wait`
    pub fn generalized_cost(&self) -> Option<f64> {
        let vot = self.value_of_time()?;
        Some(
            self.fare_paid
                + vot * self.travel_time?
                + WAIT_TIME_PENALTY * vot * self.wait_time?,
        )
    }
}

/// Parsed survey plus the rows that were skipped.
#[derive(Debug, Clone, Default)]
pub struct Survey {
    pub records: Vec<SurveyRecord>,
    pub diagnostics: Diagnostics,
}

impl Survey {
    /// Mode names in order of first appearance.
    pub fn modes(&self) -> Vec<String> {
        let mut modes: Vec<String> = Vec::new();
        for record in &self.records {
            if !modes.contains(&record.mode) {
                modes.push(record.mode.clone());
            }
        }
        modes
    }
}

fn non_negative(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v >= 0.0)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read survey rows from any CSV source.
///
/// Rows without a mode or a valid non-negative fare are skipped with a
/// warning. Rows the CSV reader cannot decode at all (bad UTF-8, broken
/// quoting) are skipped with an error. Invalid optional fields are dropped
/// from the record.
pub fn read_survey<R: Read>(reader: R) -> Result<Survey> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut survey = Survey::default();
    for (idx, result) in rdr.deserialize::<SurveyRow>().enumerate() {
        let row_num = idx + 1;
        let row = match result {
            Ok(row) => row,
            Err(err) => {
                survey
                    .diagnostics
                    .add_error_at_row("survey", &format!("unreadable row: {err}"), row_num);
                continue;
            }
        };

        let Some(mode) = non_blank(row.mode) else {
            survey
                .diagnostics
                .add_warning_at_row("survey", "missing Mode_Used", row_num);
            continue;
        };
        let Some(fare_paid) = non_negative(row.fare_paid) else {
            survey.diagnostics.add_warning_at_row(
                "survey",
                &format!("missing or invalid Fare_Paid for {mode}"),
                row_num,
            );
            continue;
        };

        survey.records.push(SurveyRecord {
            mode,
            fare_paid,
            wtp: non_negative(row.wtp),
            income_bracket: non_blank(row.income_bracket),
            travel_time: non_negative(row.travel_time),
            wait_time: non_negative(row.wait_time),
        });
    }

    if survey.diagnostics.has_issues() {
        warn!(
            skipped = survey.diagnostics.issues.len(),
            unreadable = survey.diagnostics.error_count(),
            kept = survey.records.len(),
            "survey rows skipped"
        );
    }
    debug!(records = survey.records.len(), "survey parsed");
    Ok(survey)
}

/// Load a survey CSV from disk.
pub fn load_survey(path: &Path) -> Result<Survey> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening survey CSV {}", path.display()))?;
    read_survey(file).with_context(|| format!("parsing survey CSV {}", path.display()))
}

/// One row per record with the derived per-trip metrics as nullable columns.
pub fn survey_frame(records: &[SurveyRecord]) -> Result<DataFrame> {
    let modes: Vec<&str> = records.iter().map(|r| r.mode.as_str()).collect();
    let income: Vec<Option<&str>> = records.iter().map(|r| r.income_bracket.as_deref()).collect();
    let fares: Vec<f64> = records.iter().map(|r| r.fare_paid).collect();
    let wtp: Vec<Option<f64>> = records.iter().map(|r| r.wtp).collect();
    let derived = |metric: fn(&SurveyRecord) -> Option<f64>| -> Vec<Option<f64>> {
        records.iter().map(metric).collect()
    };

    DataFrame::new(vec![
        Series::new(MODE_COLUMN, modes),
        Series::new(INCOME_COLUMN, income),
        Series::new(FARE_COLUMN, fares),
        Series::new(WTP_COLUMN, wtp),
        Series::new(
            AFFORDABILITY_COLUMN,
            derived(SurveyRecord::affordability_ratio),
        ),
        Series::new(VALUE_OF_TIME_COLUMN, derived(SurveyRecord::value_of_time)),
        Series::new(
            GENERALIZED_COST_COLUMN,
            derived(SurveyRecord::generalized_cost),
        ),
    ])
    .context("building survey frame")
}

/// Policy inputs that the survey cannot supply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileAssumptions {
    /// Elasticity for modes without an override
    #[serde(default = "default_elasticity")]
    pub default_elasticity: f64,
    #[serde(default)]
    pub elasticity_overrides: BTreeMap<String, f64>,
    /// Elasticity per income bracket; wins over the mode override when
    /// profiling income groups
    #[serde(default)]
    pub income_elasticity: BTreeMap<String, f64>,
    /// Operating cost per trip as a fraction of the mean fare
    #[serde(default = "default_cost_ratio")]
    pub cost_ratio: f64,
}

fn default_elasticity() -> f64 {
    -0.5
}

fn default_cost_ratio() -> f64 {
    0.6
}

impl Default for ProfileAssumptions {
    fn default() -> Self {
        Self {
            default_elasticity: default_elasticity(),
            elasticity_overrides: BTreeMap::new(),
            income_elasticity: BTreeMap::new(),
            cost_ratio: default_cost_ratio(),
        }
    }
}

impl ProfileAssumptions {
    pub fn elasticity_for(&self, mode: &str) -> f64 {
        self.elasticity_overrides
            .get(mode)
            .copied()
            .unwrap_or(self.default_elasticity)
    }

    /// Income bracket override, then mode override, then the default.
    pub fn elasticity_for_group(&self, mode: &str, income_bracket: &str) -> f64 {
        self.income_elasticity
            .get(income_bracket)
            .copied()
            .unwrap_or_else(|| self.elasticity_for(mode))
    }
}

/// Mean fare and trip count per group of `keys`, groups in order of first
/// appearance. Rows with a null key are dropped.
pub(crate) fn fare_totals(frame: &DataFrame, keys: &[&str]) -> Result<DataFrame> {
    let present = keys
        .iter()
        .map(|key| col(key).is_not_null())
        .reduce(|acc, expr| acc.and(expr))
        .unwrap_or_else(|| lit(true));
    frame
        .clone()
        .lazy()
        .filter(present)
        .group_by_stable(keys.iter().map(|key| col(key)).collect::<Vec<_>>())
        .agg([
            col(FARE_COLUMN).mean().alias("mean_fare"),
            col(FARE_COLUMN).count().cast(DataType::Int64).alias("trips"),
        ])
        .collect()
        .with_context(|| format!("aggregating fares by {}", keys.join(", ")))
}

/// One profile per mode, in order of first appearance.
///
/// `base_price` is the mean fare paid, `base_demand` the number of trips and
/// `unit_cost = cost_ratio × base_price`.
pub fn aggregate_profiles(
    records: &[SurveyRecord],
    assumptions: &ProfileAssumptions,
) -> Result<Vec<ModeEconomicProfile>> {
    let totals = fare_totals(&survey_frame(records)?, &[MODE_COLUMN])?;
    let modes = totals.column(MODE_COLUMN)?.utf8()?;
    let mean_fare = totals.column("mean_fare")?.f64()?;
    let trips = totals.column("trips")?.i64()?;

    let mut profiles = Vec::with_capacity(totals.height());
    for idx in 0..totals.height() {
        let (Some(mode), Some(fare), Some(trips)) =
            (modes.get(idx), mean_fare.get(idx), trips.get(idx))
        else {
            continue;
        };
        let profile = ModeEconomicProfile::new(
            mode,
            fare,
            trips as f64,
            assumptions.elasticity_for(mode),
            assumptions.cost_ratio * fare,
        )
        .with_context(|| format!("profiling mode '{mode}' from survey"))?;
        profiles.push(profile);
    }
    Ok(profiles)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
respondent_id,Mode_Used,Income_Bracket,Travel_Time,Fare_Paid,Wait_Time,WTP
1,Bus,Low,40,30,10,25
2,MRT,High,20,80,5,120
3,Bus,Mid,35,50,5,60
4,,Low,30,20,5,30
5,Leguna,Low,25,abc,5,30
6,Leguna,Low,25,20,5,
";

    #[test]
    fn test_reads_rows_and_skips_bad_ones() {
        let survey = read_survey(SAMPLE.as_bytes()).unwrap();
        assert_eq!(survey.records.len(), 4);
        assert_eq!(survey.diagnostics.warning_count(), 2);
        assert_eq!(survey.modes(), ["Bus", "MRT", "Leguna"]);

        let leguna = &survey.records[3];
        assert_eq!(leguna.fare_paid, 20.0);
        assert_eq!(leguna.wtp, None);
        assert_eq!(leguna.affordability_ratio(), None);
    }

    #[test]
    fn test_derived_record_metrics() {
        let record = SurveyRecord::new("Bus", 30.0)
            .with_wtp(60.0)
            .with_times(40.0, 10.0);
        assert_eq!(record.total_time(), Some(50.0));
        assert_eq!(record.affordability_ratio(), Some(0.5));
        assert_eq!(record.value_of_time(), Some(1.2));
        // 30 + 1.2·40 + 1.5·1.2·10
        let gc = record.generalized_cost().unwrap();
        assert!((gc - 96.0).abs() < 1e-9);
    }

    #[test]
    fn test_aggregate_profiles() {
        let survey = read_survey(SAMPLE.as_bytes()).unwrap();
        let mut assumptions = ProfileAssumptions::default();
        assumptions.elasticity_overrides.insert("MRT".into(), -0.4);

        let profiles = aggregate_profiles(&survey.records, &assumptions).unwrap();
        assert_eq!(profiles.len(), 3);

        let bus = &profiles[0];
        assert_eq!(bus.name(), "Bus");
        assert_eq!(bus.base_price(), 40.0);
        assert_eq!(bus.base_demand(), 2.0);
        assert_eq!(bus.price_elasticity(), -0.5);
        assert!((bus.unit_cost() - 24.0).abs() < 1e-9);
        assert_eq!(profiles[1].price_elasticity(), -0.4);
    }

    #[test]
    fn test_undecodable_row_is_recorded_as_error() {
        let mut csv = b"Mode_Used,Fare_Paid\nBus,30\n".to_vec();
        csv.extend_from_slice(b"\xff\xfe,40\nMRT,60\n");
        let survey = read_survey(csv.as_slice()).unwrap();
        assert_eq!(survey.records.len(), 2);
        assert_eq!(survey.diagnostics.error_count(), 1);
        assert!(survey.diagnostics.has_errors());
        assert_eq!(survey.diagnostics.issues[0].row, Some(2));
    }

    #[test]
    fn test_survey_frame_columns() {
        let survey = read_survey(SAMPLE.as_bytes()).unwrap();
        let frame = survey_frame(&survey.records).unwrap();
        assert_eq!(frame.height(), 4);
        // Leguna has no WTP, so no affordability ratio either
        assert_eq!(frame.column(AFFORDABILITY_COLUMN).unwrap().null_count(), 1);
        assert_eq!(frame.column(INCOME_COLUMN).unwrap().null_count(), 0);
    }

    #[test]
    fn test_group_elasticity_precedence() {
        let mut assumptions = ProfileAssumptions::default();
        assumptions.elasticity_overrides.insert("MRT".into(), -0.4);
        assumptions.income_elasticity.insert("Low".into(), -0.9);
        assert_eq!(assumptions.elasticity_for_group("MRT", "Low"), -0.9);
        assert_eq!(assumptions.elasticity_for_group("MRT", "High"), -0.4);
        assert_eq!(assumptions.elasticity_for_group("Bus", "High"), -0.5);
    }

    #[test]
    fn test_free_mode_cannot_be_profiled() {
        let records = vec![SurveyRecord::new("Walk", 0.0)];
        assert!(aggregate_profiles(&records, &ProfileAssumptions::default()).is_err());
    }
}
