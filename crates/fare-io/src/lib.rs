//! # fare-io: Survey input, equity metrics and reports
//!
//! - [`survey`]: read stated-preference survey CSVs and aggregate them into
//!   [`fare_core::ModeEconomicProfile`]s
//! - [`equity`]: willingness to pay, affordability, value of time, Gini
//! - [`income`]: optimal fares per (mode, income bracket) group
//! - [`policy`]: income-targeted subsidy scenarios
//! - [`report`]: JSON and Markdown analysis reports

pub mod equity;
pub mod income;
pub mod policy;
pub mod report;
pub mod survey;

pub use equity::{
    affordability_by_group, generalized_cost_by_mode, gini_by_mode, gini_coefficient,
    value_of_time_by_group, wtp_by_group, AffordabilitySummary, EquityReport, Summary,
    ValueOfTimeSummary,
};
pub use income::{
    aggregate_income_profiles, optimize_income_groups, IncomeGroupPlan, IncomeGroupProfile,
    GROUP_BOUND_MULTIPLIERS,
};
pub use policy::{default_policies, evaluate_subsidy_policies, PolicyOutcome, SubsidyPolicy};
pub use report::{write_json, write_markdown, AnalysisReport, BlendReport, SweepReport};
pub use survey::{
    aggregate_profiles, load_survey, read_survey, survey_frame, ProfileAssumptions, Survey,
    SurveyRecord,
};
