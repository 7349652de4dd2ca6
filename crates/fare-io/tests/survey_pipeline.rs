//! Survey file to report pipeline tests

use std::fs;

use fare_algo::{default_criteria, rank, results_by_mode, FareOptimizer, ModeJob};
use fare_core::{FareModel, PriceBounds};
use fare_io::{
    aggregate_income_profiles, aggregate_profiles, default_policies, evaluate_subsidy_policies,
    load_survey, optimize_income_groups, write_json, write_markdown, AnalysisReport,
    EquityReport, ProfileAssumptions,
};
use tempfile::tempdir;

const SURVEY: &str = "\
respondent_id,Mode_Used,Income_Bracket,Trip_Purpose,Travel_Time,Fare_Paid,Wait_Time,Comfort,WTP
1,Bus,Low,Work,45,35,12,2,30
2,Bus,Mid,Work,40,45,10,3,60
3,Bus,High,Leisure,35,40,8,3,90
4,MRT,Mid,Work,20,70,5,4,80
5,MRT,High,Work,18,75,4,5,140
6,MRT,Low,Education,22,65,6,4,50
7,Leguna,Low,Work,30,20,7,2,25
8,Leguna,Mid,Shopping,28,30,6,2,35
9,Leguna,Low,Work,32,,7,2,25
";

#[test]
fn test_survey_to_report() {
    let dir = tempdir().expect("temp dir");
    let csv_path = dir.path().join("survey.csv");
    fs::write(&csv_path, SURVEY).expect("write survey");

    let survey = load_survey(&csv_path).expect("survey should load");
    assert_eq!(survey.records.len(), 8);
    assert_eq!(survey.diagnostics.warning_count(), 1);

    let profiles = aggregate_profiles(&survey.records, &ProfileAssumptions::default())
        .expect("profiles");
    let names: Vec<&str> = profiles.iter().map(|p| p.name()).collect();
    assert_eq!(names, ["Bus", "MRT", "Leguna"]);

    let jobs: Vec<ModeJob> = profiles
        .iter()
        .map(|p| {
            ModeJob::new(
                FareModel::from_profile(p).unwrap(),
                PriceBounds::around(p.base_price(), 0.5, 2.0).unwrap(),
            )
        })
        .collect();
    let plans = FareOptimizer::new().optimize_modes(&jobs).expect("optimize");
    let rankings =
        rank(&profiles, &results_by_mode(&plans), &default_criteria()).expect("ranking");

    let equity = EquityReport::from_records(&survey.records).expect("equity metrics");
    assert_eq!(equity.wtp_by_income["Low"].count, 3);
    let policies = evaluate_subsidy_policies(&survey.records, &default_policies()).unwrap();
    assert_eq!(policies.len(), 5);

    let mut assumptions = ProfileAssumptions::default();
    assumptions.income_elasticity.insert("Low".into(), -0.8);
    let groups = aggregate_income_profiles(&survey.records, &assumptions).expect("groups");
    assert_eq!(groups.len(), 8);
    let income_plans =
        optimize_income_groups(&FareOptimizer::new(), &groups, 0.5, 2.0).expect("group fares");

    let report = AnalysisReport::new("Survey analysis", profiles, plans)
        .with_rankings(rankings)
        .with_equity(equity, policies)
        .with_income_plans(income_plans)
        .with_diagnostics(survey.diagnostics);

    let md_path = dir.path().join("report.md");
    let json_path = dir.path().join("report.json");
    write_markdown(&report, &md_path).expect("markdown written");
    write_json(&report, &json_path).expect("json written");

    let md = fs::read_to_string(&md_path).unwrap();
    assert!(md.contains("## Multi-criteria ranking"));
    assert!(md.contains("## Subsidy policies"));
    assert!(md.contains("## Fares by income group"));
    assert!(md.contains("| Leguna | Low | 20.00 | 1 | -0.80 |"));
    assert!(md.contains("missing or invalid Fare_Paid"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json["rankings"].as_array().map(Vec::len), Some(3));
    assert_eq!(json["modes"][0]["name"], "Bus");
}

#[test]
fn test_missing_file_reports_path() {
    let err = load_survey(std::path::Path::new("/nonexistent/survey.csv")).unwrap_err();
    assert!(format!("{err:#}").contains("survey.csv"));
}
