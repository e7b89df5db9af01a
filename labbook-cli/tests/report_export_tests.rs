//! Report export round trips through the file system.
//!
//! Records serialized the way a host would store them SHALL produce report
//! files named after the record, with every section present.

use labbook_cli::commands::{experiment_report_file, knowledge_hub_report_file};
use labbook_cli::config::CliConfig;
use labbook_cli::error::CliError;
use labbook_core::{Estimator, EstimatorConfig};
use labbook_test_utils::fixtures;

fn estimator() -> Estimator {
    Estimator::new(EstimatorConfig::default()).unwrap()
}

#[test]
fn experiment_report_is_written_under_slugged_name() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("record.json");
    let record = fixtures::completed_experiment();
    std::fs::write(&input, serde_json::to_string(&record).unwrap()).unwrap();

    let out_dir = dir.path().join("reports");
    let path = experiment_report_file(&estimator(), &input, &out_dir).unwrap();
    assert_eq!(path, out_dir.join("pricing-page-layout-report.txt"));

    let text = std::fs::read_to_string(&path).unwrap();
    for section in ["EXPERIMENT REPORT", "OVERVIEW", "RESULTS", "CONCLUSION", "RECOMMENDATIONS"] {
        assert!(text.contains(section), "missing section {}", section);
    }
    assert!(text.contains("p-value: 0.001"));
}

#[test]
fn knowledge_hub_report_counts_knowledge_records() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("records.json");
    let mut records = fixtures::one_of_each_status();
    records.push(fixtures::knowledge_record());
    std::fs::write(&input, serde_json::to_string(&records).unwrap()).unwrap();

    let path = knowledge_hub_report_file(&input, dir.path(), 5).unwrap();
    assert!(path.ends_with("knowledge-hub-report.txt"));

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("Total records: 4"));
    assert!(text.contains("Documented: 2"));
    assert!(text.contains("Leading with the annual plan lifts trial starts"));
}

#[test]
fn malformed_record_is_a_json_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bad.json");
    std::fs::write(&input, "{\"name\": 3}").unwrap();

    let err = experiment_report_file(&estimator(), &input, dir.path()).unwrap_err();
    assert!(matches!(err, CliError::Json(_)));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn missing_input_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = experiment_report_file(&estimator(), &dir.path().join("none.json"), dir.path())
        .unwrap_err();
    assert!(matches!(err, CliError::Io { .. }));
}

#[test]
fn config_file_drives_estimator_threshold() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("labbook.toml");
    std::fs::write(&path, "[estimator]\nsignificance_threshold = 0.001\n").unwrap();

    let config = CliConfig::load(Some(&path)).unwrap();
    let estimator = Estimator::new(config.estimator_config()).unwrap();
    let result = estimator
        .significance(&fixtures::clear_win().into())
        .unwrap();
    assert!(!result.significant);
}
