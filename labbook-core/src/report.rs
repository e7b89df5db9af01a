//! Plain-text reports for download.
//!
//! Two fixed templates: a per-experiment report and a knowledge hub summary.
//! The core supplies the text and the file name; delivery is up to the host.

use crate::{ExperimentRecord, Phase, SignificanceResult, Status};

/// File name of the knowledge hub report.
pub const KNOWLEDGE_HUB_REPORT_FILE: &str = "knowledge-hub-report.txt";

const RULE: &str = "========================================";

/// `<experiment-name>-report.txt`, with the name slugged for file systems.
pub fn report_file_name(experiment_name: &str) -> String {
    let mut slug = String::with_capacity(experiment_name.len());
    for c in experiment_name.trim().chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "experiment-report.txt".to_string()
    } else {
        format!("{}-report.txt", slug)
    }
}

fn or_unset(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("Not specified")
}

/// Render the experiment report.
///
/// `results` is `None` when no observed data exists yet; the results and
/// conclusion sections then say so instead of printing numbers.
pub fn experiment_report(
    record: &ExperimentRecord,
    results: Option<&SignificanceResult>,
) -> String {
    let mut out = String::new();

    out.push_str("EXPERIMENT REPORT\n");
    out.push_str(&format!("{}\n", RULE));
    out.push_str(&format!("Name: {}\n", record.name));
    out.push_str(&format!("Status: {}\n", display_status(record)));
    out.push_str(&format!("Generated: {}\n", chrono::Utc::now().format("%Y-%m-%d")));
    out.push('\n');

    out.push_str("OVERVIEW\n");
    out.push_str(&format!("Goal: {}\n", or_unset(&record.goal)));
    out.push_str(&format!("Hypothesis: {}\n", or_unset(&record.hypothesis)));
    out.push_str(&format!("Primary metric: {}\n", or_unset(&record.metric)));
    out.push_str(&format!("Owner: {}\n", or_unset(&record.owner)));
    out.push('\n');

    out.push_str("RESULTS\n");
    match (results, record.results.as_ref()) {
        (Some(r), observed) => {
            if let Some(o) = observed {
                out.push_str(&format!(
                    "Control: {} conversions / {} users ({:.2}%)\n",
                    o.control_conversions, o.control_users, r.control_rate
                ));
                out.push_str(&format!(
                    "Treatment: {} conversions / {} users ({:.2}%)\n",
                    o.treatment_conversions, o.treatment_users, r.treatment_rate
                ));
            } else {
                out.push_str(&format!("Control rate: {:.2}%\n", r.control_rate));
                out.push_str(&format!("Treatment rate: {:.2}%\n", r.treatment_rate));
            }
            out.push_str(&format!("Improvement: {:+.1}%\n", r.improvement));
            out.push_str(&format!("Confidence: {:.1}%\n", r.confidence));
            out.push_str(&format!("p-value: {}\n", r.p_value));
        }
        (None, _) => {
            out.push_str("No results recorded yet.\n");
        }
    }
    out.push('\n');

    out.push_str("CONCLUSION\n");
    out.push_str(&format!("{}\n", conclusion(results)));
    out.push('\n');

    out.push_str("RECOMMENDATIONS\n");
    for line in recommendations(results) {
        out.push_str(&format!("- {}\n", line));
    }

    out
}

fn display_status(record: &ExperimentRecord) -> String {
    record
        .resolved_status()
        .map(|s| s.label().to_string())
        .unwrap_or_else(|| record.status.clone())
}

fn conclusion(results: Option<&SignificanceResult>) -> &'static str {
    match results {
        None => "Inconclusive: the experiment has no recorded results.",
        Some(r) if r.significant && r.improvement > 0.0 => {
            "The treatment outperformed the control with statistical significance."
        }
        Some(r) if r.significant && r.improvement < 0.0 => {
            "The treatment underperformed the control with statistical significance."
        }
        Some(r) if r.significant => {
            "The groups differ with statistical significance but show no net lift."
        }
        Some(_) => "The observed difference is not statistically significant.",
    }
}

fn recommendations(results: Option<&SignificanceResult>) -> Vec<&'static str> {
    match results {
        None => vec!["Collect results before drawing conclusions."],
        Some(r) if r.significant && r.improvement > 0.0 => vec![
            "Roll out the treatment to all users.",
            "Document the learning in the knowledge hub.",
        ],
        Some(r) if r.significant => vec![
            "Keep the control experience.",
            "Record why the hypothesis failed in the knowledge hub.",
        ],
        Some(_) => vec![
            "Extend the experiment or increase traffic to reach significance.",
            "Revisit the minimum detectable effect used for sizing.",
        ],
    }
}

/// Aggregate view of knowledge records.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct KnowledgeHubSummary {
    pub total: usize,
    pub analyzing: usize,
    pub documented: usize,
    pub applied: usize,
    /// Knowledge records whose status label did not resolve.
    pub other: usize,
    pub top_insights: Vec<String>,
}

impl KnowledgeHubSummary {
    /// Summarize the knowledge-phase records in `records`, keeping at most
    /// `max_insights` insights. Applied records are listed first.
    pub fn from_records(records: &[ExperimentRecord], max_insights: usize) -> Self {
        let mut summary = KnowledgeHubSummary {
            total: 0,
            analyzing: 0,
            documented: 0,
            applied: 0,
            other: 0,
            top_insights: Vec::new(),
        };

        let mut knowledge: Vec<&ExperimentRecord> =
            records.iter().filter(|r| r.phase == Phase::Knowledge).collect();
        knowledge.sort_by_key(|r| {
            (
                std::cmp::Reverse(r.resolved_status().map(|s| s.order()).unwrap_or(0)),
                std::cmp::Reverse(r.updated_at),
            )
        });

        for record in &knowledge {
            summary.total += 1;
            match record.resolved_status() {
                Some(Status::Analyzing) => summary.analyzing += 1,
                Some(Status::Documented) => summary.documented += 1,
                Some(Status::Applied) => summary.applied += 1,
                _ => summary.other += 1,
            }
        }

        summary.top_insights = knowledge
            .iter()
            .flat_map(|r| r.insights.iter().map(move |i| format!("{}: {}", r.name, i)))
            .take(max_insights)
            .collect();

        summary
    }
}

/// Render the knowledge hub report.
pub fn knowledge_hub_report(summary: &KnowledgeHubSummary) -> String {
    let mut out = String::new();
    out.push_str("KNOWLEDGE HUB REPORT\n");
    out.push_str(&format!("{}\n", RULE));
    out.push_str(&format!("Generated: {}\n", chrono::Utc::now().format("%Y-%m-%d")));
    out.push('\n');
    out.push_str("SUMMARY\n");
    out.push_str(&format!("Total records: {}\n", summary.total));
    out.push_str(&format!("Analyzing: {}\n", summary.analyzing));
    out.push_str(&format!("Documented: {}\n", summary.documented));
    out.push_str(&format!("Applied: {}\n", summary.applied));
    if summary.other > 0 {
        out.push_str(&format!("Other: {}\n", summary.other));
    }
    out.push('\n');
    out.push_str("TOP INSIGHTS\n");
    if summary.top_insights.is_empty() {
        out.push_str("No insights captured yet.\n");
    }
    for (i, insight) in summary.top_insights.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, insight));
    }
    out
}
