//! LABBOOK CLI
//!
//! Sample-size and significance calculators plus report export.
//!
//! # Commands
//!
//! - `sample-size`: users per variant from baseline rate and minimum detectable effect
//! - `power`: users per variant from effect size and standard deviation
//! - `significance`: read out observed control/treatment counts
//! - `report`: write a plain-text report for a record (or the knowledge hub)
//! - `statuses`: print the status catalog

use clap::{Parser, Subcommand};
use labbook_cli::commands;
use labbook_cli::config::{CliConfig, CONFIG_ENV_VAR};
use labbook_cli::error::CliError;
use labbook_cli::logging::init_logging;
use labbook_core::{Estimator, PowerRequest, SampleSizeRequest, SignificanceRequest, TestType};
use std::path::PathBuf;
use std::process::ExitCode;

/// LABBOOK - experiment planning and readout
#[derive(Parser)]
#[command(name = "labbook")]
#[command(version)]
#[command(about = "Experiment sizing, significance and reports")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    /// Print command output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Users per variant for a conversion-rate test
    SampleSize {
        /// Baseline conversion rate, percent (0-100)
        #[arg(long)]
        baseline_rate: f64,
        /// Relative lift to detect, percent (0-100)
        #[arg(long)]
        mde: f64,
        /// Users entering the test per day, to estimate duration
        #[arg(long)]
        daily_traffic: Option<u64>,
    },
    /// Users per variant from a standardized effect size
    Power {
        /// traditional, nontraditional or multivariate
        #[arg(long, default_value = "traditional")]
        test_type: TestType,
        #[arg(long)]
        effect_size: f64,
        #[arg(long)]
        std_dev: f64,
        #[arg(long, default_value_t = 0.8)]
        power: f64,
        #[arg(long, default_value_t = 0.05)]
        alpha: f64,
    },
    /// Significance of observed control/treatment counts
    Significance {
        #[arg(long)]
        control_users: u64,
        #[arg(long)]
        control_conversions: u64,
        #[arg(long)]
        treatment_users: u64,
        #[arg(long)]
        treatment_conversions: u64,
    },
    /// Write a plain-text report
    ///
    /// Reads one experiment record as JSON and writes `<name>-report.txt`.
    /// With `--knowledge-hub`, reads a JSON array of records and writes
    /// `knowledge-hub-report.txt`.
    Report {
        /// JSON input file
        input: PathBuf,
        /// Summarize knowledge records instead of one experiment
        #[arg(long)]
        knowledge_hub: bool,
        /// Output directory (overrides the config file)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Print the status catalog and the actions offered from each status
    Statuses,
}

fn run(cli: Cli) -> Result<String, CliError> {
    let config = CliConfig::load(cli.config.as_deref())?;
    let estimator = Estimator::new(config.estimator_config())?;
    tracing::debug!(config = ?estimator.config(), "estimator configured");

    match cli.command {
        Commands::SampleSize {
            baseline_rate,
            mde,
            daily_traffic,
        } => commands::sample_size(
            &estimator,
            &SampleSizeRequest {
                baseline_rate,
                minimum_detectable_effect: mde,
            },
            daily_traffic,
            cli.json,
        ),
        Commands::Power {
            test_type,
            effect_size,
            std_dev,
            power,
            alpha,
        } => commands::power(
            &estimator,
            &PowerRequest {
                test_type,
                effect_size,
                standard_deviation: std_dev,
                power,
                alpha,
            },
            cli.json,
        ),
        Commands::Significance {
            control_users,
            control_conversions,
            treatment_users,
            treatment_conversions,
        } => commands::significance(
            &estimator,
            &SignificanceRequest {
                control_users,
                control_conversions,
                treatment_users,
                treatment_conversions,
            },
            cli.json,
        ),
        Commands::Report {
            input,
            knowledge_hub,
            output_dir,
        } => {
            let output_dir = output_dir.unwrap_or_else(|| config.report.output_dir.clone());
            let path = if knowledge_hub {
                commands::knowledge_hub_report_file(
                    &input,
                    &output_dir,
                    config.report.max_insights,
                )?
            } else {
                commands::experiment_report_file(&estimator, &input, &output_dir)?
            };
            Ok(path.display().to_string())
        }
        Commands::Statuses => commands::statuses(cli.json),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging(cli.log_json) {
        eprintln!("{}", err);
        return ExitCode::from(err.exit_code());
    }

    match run(cli) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            eprintln!("error: {}", err);
            ExitCode::from(err.exit_code())
        }
    }
}
