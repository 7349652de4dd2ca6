use clap::{CommandFactory, Parser, Subcommand, ValueEnum, ValueHint};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fare", author, version, about, long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info", global = true)]
    pub log_level: tracing::Level,

    /// Worker threads for per-mode optimization ("auto" or a number)
    #[arg(long, default_value = "auto", global = true)]
    pub threads: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Optimize every objective for every mode in an analysis spec
    Optimize {
        /// Analysis spec (YAML or JSON)
        #[arg(long, value_hint = ValueHint::FilePath)]
        spec: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
        /// Write JSON results to a file instead of stdout
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out: Option<PathBuf>,
    },
    /// Rank modes by weighted multi-criteria score
    Rank {
        /// Analysis spec (YAML or JSON)
        #[arg(long, value_hint = ValueHint::FilePath)]
        spec: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Re-optimize one objective while sweeping a mode parameter
    Sweep {
        /// Analysis spec (YAML or JSON)
        #[arg(long, value_hint = ValueHint::FilePath)]
        spec: PathBuf,
        /// Mode to sweep; runs the sweeps declared in the analysis file when omitted
        #[arg(long, requires_all = ["parameter", "values"])]
        mode: Option<String>,
        /// Parameter to vary (elasticity, base_demand, base_price, unit_cost)
        #[arg(long)]
        parameter: Option<String>,
        /// Comma-separated parameter values
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        values: Option<Vec<f64>>,
        /// Objective to optimize at each point
        #[arg(long, default_value = "social_welfare")]
        objective: String,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Run the full analysis and write a report
    Report {
        /// Analysis spec (YAML or JSON)
        #[arg(long, value_hint = ValueHint::FilePath)]
        spec: PathBuf,
        /// Markdown report destination
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out: PathBuf,
        /// Also write the report as JSON
        #[arg(long, value_hint = ValueHint::FilePath)]
        json: Option<PathBuf>,
        /// Survey CSV whose equity metrics are appended to the report
        #[arg(long, value_hint = ValueHint::FilePath)]
        survey: Option<PathBuf>,
    },
    /// Summarize a passenger survey and derive mode profiles from it
    Survey {
        /// Survey CSV
        #[arg(long, value_hint = ValueHint::FilePath)]
        csv: PathBuf,
        /// Price elasticity assumed for every mode
        #[arg(long, default_value_t = -0.5, allow_hyphen_values = true)]
        elasticity: f64,
        /// Operating cost as a share of the mean fare
        #[arg(long, default_value_t = 0.6)]
        cost_ratio: f64,
        /// Also optimize fares for every (mode, income bracket) group
        #[arg(long)]
        by_income: bool,
        /// Elasticity for one income bracket, e.g. Low=-0.8 (repeatable)
        #[arg(
            long = "income-elasticity",
            value_name = "BRACKET=VALUE",
            value_parser = parse_key_value,
            allow_hyphen_values = true
        )]
        income_elasticity: Vec<(String, f64)>,
        /// Write an analysis spec built from the derived profiles
        #[arg(long, value_hint = ValueHint::FilePath)]
        emit_spec: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
        /// Write output to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}

/// Parse `KEY=VALUE` with a numeric value.
fn parse_key_value(raw: &str) -> Result<(String, f64), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{raw}'"));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|err| format!("invalid value in '{raw}': {err}"))?;
    Ok((key.to_string(), value))
}
