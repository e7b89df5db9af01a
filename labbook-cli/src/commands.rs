//! Subcommand handlers.
//!
//! Each handler returns the text to print so it can be tested without
//! capturing stdout.

use crate::error::CliError;
use labbook_core::{
    available_actions, estimate_duration_days, experiment_report, knowledge_hub_report,
    report_file_name, Estimator, ExperimentRecord, KnowledgeHubSummary, Phase, PowerRequest,
    SampleSizeRequest, SampleSizeResult, SignificanceRequest, StatusMeta, UserAction,
    KNOWLEDGE_HUB_REPORT_FILE,
};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Variants assumed when turning a sample size into a duration.
const DURATION_VARIANTS: u32 = 2;

#[derive(Debug, Serialize)]
struct SampleSizeOutput {
    #[serde(flatten)]
    result: SampleSizeResult,
    duration_days: Option<u64>,
}

fn to_json<T: Serialize>(value: &T) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn sample_size(
    estimator: &Estimator,
    request: &SampleSizeRequest,
    daily_traffic: Option<u64>,
    json: bool,
) -> Result<String, CliError> {
    let result = estimator.sample_size(request)?;
    let duration_days = daily_traffic
        .map(|traffic| estimate_duration_days(result.users_per_variant, DURATION_VARIANTS, traffic))
        .transpose()?;

    if json {
        return to_json(&SampleSizeOutput {
            result,
            duration_days,
        });
    }

    let mut out = format!(
        "Users per variant: {}\nTotal users: {}",
        result.users_per_variant, result.total_users
    );
    if let Some(days) = duration_days {
        let _ = write!(out, "\nEstimated duration: {} days", days);
    }
    Ok(out)
}

pub fn power(
    estimator: &Estimator,
    request: &PowerRequest,
    json: bool,
) -> Result<String, CliError> {
    let result = estimator.power(request)?;
    if json {
        return to_json(&result);
    }
    Ok(format!(
        "Users per variant: {}\nTest type: {} (x{})",
        result.users_per_variant, result.test_type, result.multiplier
    ))
}

pub fn significance(
    estimator: &Estimator,
    request: &SignificanceRequest,
    json: bool,
) -> Result<String, CliError> {
    let result = estimator.significance(request)?;
    if json {
        return to_json(&result);
    }
    Ok(format!(
        "Control rate: {:.2}%\nTreatment rate: {:.2}%\nImprovement: {:+.1}%\n\
         Chi-square: {:.4}\np-value: {}\nConfidence: {:.1}%\nSignificant: {}",
        result.control_rate,
        result.treatment_rate,
        result.improvement,
        result.chi_square,
        result.p_value,
        result.confidence,
        if result.significant { "yes" } else { "no" }
    ))
}

#[derive(Debug, Serialize)]
struct StatusEntry {
    #[serde(flatten)]
    meta: StatusMeta,
    actions: Vec<UserAction>,
}

/// The status catalog grouped by phase, with the actions offered from each.
pub fn statuses(json: bool) -> Result<String, CliError> {
    let entries: Vec<StatusEntry> = Phase::ALL
        .iter()
        .flat_map(|phase| phase.statuses())
        .map(|status| StatusEntry {
            meta: status.meta(),
            actions: available_actions(status),
        })
        .collect();

    if json {
        return to_json(&entries);
    }

    let mut out = String::new();
    for phase in Phase::ALL {
        let _ = writeln!(out, "{}", phase.as_db_str().to_uppercase());
        for entry in entries.iter().filter(|e| e.meta.phase == phase) {
            let actions: Vec<&str> = entry.actions.iter().map(|a| a.as_db_str()).collect();
            let _ = writeln!(
                out,
                "  {:<2} {:<15} {:<8} {}",
                entry.meta.order,
                entry.meta.label,
                format!("{:?}", entry.meta.color).to_lowercase(),
                actions.join(", ")
            );
        }
    }
    Ok(out.trim_end().to_string())
}

fn read_to_string(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|e| CliError::io(path, e))
}

fn write_report(output_dir: &Path, file_name: &str, text: &str) -> Result<PathBuf, CliError> {
    std::fs::create_dir_all(output_dir).map_err(|e| CliError::io(output_dir, e))?;
    let path = output_dir.join(file_name);
    std::fs::write(&path, text).map_err(|e| CliError::io(&path, e))?;
    tracing::info!(path = %path.display(), bytes = text.len(), "report written");
    Ok(path)
}

/// Write `<name>-report.txt` for the record stored as JSON at `input`.
pub fn experiment_report_file(
    estimator: &Estimator,
    input: &Path,
    output_dir: &Path,
) -> Result<PathBuf, CliError> {
    let record: ExperimentRecord = serde_json::from_str(&read_to_string(input)?)?;
    let readout = record
        .results
        .map(|observed| estimator.significance(&observed.into()))
        .transpose()?;
    let text = experiment_report(&record, readout.as_ref());
    write_report(output_dir, &report_file_name(&record.name), &text)
}

/// Write `knowledge-hub-report.txt` for the JSON array of records at `input`.
pub fn knowledge_hub_report_file(
    input: &Path,
    output_dir: &Path,
    max_insights: usize,
) -> Result<PathBuf, CliError> {
    let records: Vec<ExperimentRecord> = serde_json::from_str(&read_to_string(input)?)?;
    let summary = KnowledgeHubSummary::from_records(&records, max_insights);
    write_report(
        output_dir,
        KNOWLEDGE_HUB_REPORT_FILE,
        &knowledge_hub_report(&summary),
    )
}
