use anyhow::Result;
use clap::Parser;
use clap_complete::{generate, Shell};
use fare_cli::cli::{build_cli_command, Cli, Commands};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

mod commands;

use crate::commands::survey::SurveyOptions;
use crate::commands::sweep::SweepRequest;
use crate::commands::util::configure_threads;
use crate::commands::{optimize, rank, report, survey, sweep};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // stdout carries tables and JSON
    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(io::stderr)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install log subscriber: {err}");
    }

    configure_threads(&cli.threads);

    let Some(command) = &cli.command else {
        info!("no command given; run `fare --help` for usage");
        return ExitCode::SUCCESS;
    };

    match run(command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(command: &Commands) -> Result<()> {
    match command {
        Commands::Optimize { spec, format, out } => {
            info!("optimizing fares from {}", spec.display());
            optimize::handle(spec, *format, out.as_deref())
        }
        Commands::Rank { spec, format } => {
            info!("ranking modes from {}", spec.display());
            rank::handle(spec, *format)
        }
        Commands::Sweep {
            spec,
            mode,
            parameter,
            values,
            objective,
            format,
        } => {
            let request = match (mode, parameter, values) {
                (Some(mode), Some(parameter), Some(values)) => Some(SweepRequest {
                    mode,
                    parameter,
                    values,
                    objective,
                }),
                _ => None,
            };
            sweep::handle(spec, request, *format)
        }
        Commands::Report {
            spec,
            out,
            json,
            survey,
        } => {
            info!("building report from {}", spec.display());
            report::handle(spec, out, json.as_deref(), survey.as_deref())
        }
        Commands::Survey {
            csv,
            elasticity,
            cost_ratio,
            by_income,
            income_elasticity,
            emit_spec,
            format,
        } => {
            info!("summarizing survey {}", csv.display());
            let options = SurveyOptions {
                elasticity: *elasticity,
                cost_ratio: *cost_ratio,
                by_income: *by_income,
                income_elasticity,
                emit_spec: emit_spec.as_deref(),
            };
            survey::handle(csv, &options, *format)
        }
        Commands::Completions { shell, out } => write_completions(*shell, out.as_ref()),
    }
}

fn write_completions(shell: Shell, out: Option<&PathBuf>) -> Result<()> {
    let mut cmd = build_cli_command();
    match out {
        Some(path) => {
            let mut file = File::create(path)?;
            generate(shell, &mut cmd, "fare", &mut file);
            info!("wrote {shell} completions to {}", path.display());
        }
        None => generate(shell, &mut cmd, "fare", &mut io::stdout()),
    }
    Ok(())
}
