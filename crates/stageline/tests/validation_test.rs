//! Integration tests for dataset validation.

use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use stageline::{
    EngineChoice, EtlError, FindingKind, IngestionConfig, ValidationOptions, ValidationReport,
    list_reports, run_validation,
};

/// Helper to create a temporary file with given content.
fn create_test_file(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file
}

fn validate(
    content: &str,
    config: &IngestionConfig,
    engine: EngineChoice,
    results: &Path,
) -> (bool, ValidationReport) {
    let file = create_test_file(content);
    let options = ValidationOptions::new(results).with_engine(engine);
    run_validation(file.path(), config, &options).expect("Validation errored")
}

fn engines() -> Vec<EngineChoice> {
    let mut engines = vec![EngineChoice::Lightweight];
    if cfg!(feature = "sql-engine") {
        engines.push(EngineChoice::Sql);
    }
    engines
}

fn orders_config() -> IngestionConfig {
    IngestionConfig::new(["id", "amount", "customer"], ["id", "customer"], ["id"])
}

// =============================================================================
// Passing Datasets
// =============================================================================

#[test]
fn test_clean_dataset_passes() {
    let dir = tempfile::tempdir().unwrap();
    let content = "id,amount,customer\n1,10.5,ann\n2,20,bob\n3,7,cy\n";

    for engine in engines() {
        let (passed, report) = validate(content, &orders_config(), engine, dir.path());
        assert!(passed, "engine {}", engine);
        assert!(report.findings.is_empty());
        assert_eq!(report.statistics.rows, 3);
        assert_eq!(report.statistics.failed_rules, 0);
    }
}

#[test]
fn test_extra_columns_are_allowed() {
    let dir = tempfile::tempdir().unwrap();
    let content = "notes,id,amount,customer\nx,1,10,ann\n";
    let (passed, _) = validate(content, &orders_config(), EngineChoice::Auto, dir.path());
    assert!(passed);
}

#[test]
fn test_header_only_dataset_passes() {
    let dir = tempfile::tempdir().unwrap();
    let (passed, report) = validate(
        "id,amount,customer\n",
        &orders_config(),
        EngineChoice::Auto,
        dir.path(),
    );
    assert!(passed);
    assert_eq!(report.statistics.rows, 0);
}

// =============================================================================
// Blocking Findings
// =============================================================================

#[test]
fn test_missing_required_column() {
    let dir = tempfile::tempdir().unwrap();
    let content = "id,amount\n1,10\n2,20\n";

    for engine in engines() {
        let (passed, report) = validate(content, &orders_config(), engine, dir.path());
        assert!(!passed);
        assert!(report
            .findings
            .iter()
            .any(|f| f.kind == FindingKind::MissingColumn && f.column == "customer"));
    }
}

#[test]
fn test_null_in_required_names_row() {
    let dir = tempfile::tempdir().unwrap();
    let content = "id,amount,customer\n1,10,ann\n2,20,\n3,30,NA\n";

    for engine in engines() {
        let (passed, report) = validate(content, &orders_config(), engine, dir.path());
        assert!(!passed);
        let nulls: Vec<_> = report
            .findings
            .iter()
            .filter(|f| f.kind == FindingKind::NullInRequired)
            .collect();
        assert_eq!(nulls.len(), 2, "engine {}", engine);
        assert_eq!(nulls[0].column, "customer");
        assert_eq!(nulls[0].rows, vec![1]);
        assert_eq!(nulls[0].keys.get("id").map(String::as_str), Some("2"));
        assert_eq!(nulls[1].rows, vec![2]);
    }
}

#[test]
fn test_duplicate_key_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let config = IngestionConfig::new(["id", "amount"], ["id"], ["id"]);
    let content = "id,amount\n1,10\n1,20\n";

    for engine in engines() {
        let (passed, report) = validate(content, &config, engine, dir.path());
        assert!(!passed);
        assert_eq!(report.findings.len(), 1);
        let finding = &report.findings[0];
        assert_eq!(finding.kind, FindingKind::DuplicateKey);
        assert_eq!(finding.column, "id");
        assert_eq!(finding.value.as_deref(), Some("1"));
        assert_eq!(finding.rows, vec![0, 1]);
    }
}

#[test]
fn test_repeated_null_keys_are_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let config = IngestionConfig::new(["id", "ref"], ["id"], ["ref"]);
    let content = "id,ref\n1,\n2,\n3,r1\n";

    for engine in engines() {
        let (passed, report) = validate(content, &config, engine, dir.path());
        assert!(!passed, "engine {}", engine);
        assert_eq!(report.findings.len(), 1);
        let finding = &report.findings[0];
        assert_eq!(finding.kind, FindingKind::DuplicateKey);
        assert_eq!(finding.column, "ref");
        assert!(finding.value.is_none());
        assert_eq!(finding.rows, vec![0, 1]);
    }
}

#[test]
fn test_headers_differing_only_in_case() {
    let dir = tempfile::tempdir().unwrap();
    let config = IngestionConfig::new(["id"], ["id"], ["id"]);
    let content = "id,ID\n1,a\n2,b\n";

    for engine in [EngineChoice::Auto, EngineChoice::Lightweight] {
        let (passed, report) = validate(content, &config, engine, dir.path());
        assert!(passed, "engine {}", engine);
        assert!(report.findings.is_empty());
    }
}

#[test]
fn test_engines_agree_on_findings() {
    let dir = tempfile::tempdir().unwrap();
    let content = "id,amount,customer\n1,10,ann\n1,,\n2,30,bob\n2,40,NULL\n,50,eve\n";

    let results: Vec<_> = engines()
        .into_iter()
        .map(|e| validate(content, &orders_config(), e, dir.path()).1.findings)
        .collect();
    for pair in results.windows(2) {
        assert_eq!(pair[0], pair[1]);
    }
}

// =============================================================================
// Advisories
// =============================================================================

#[test]
fn test_advisories_do_not_fail_validation() {
    let dir = tempfile::tempdir().unwrap();
    let config = IngestionConfig::from_yaml_str(
        r#"
columns:
  - id
  - name: amount
    type: float
  - email
required: [id]
unique_keys: [id]
validations:
  email: email
"#,
    )
    .unwrap();
    let content = "id,amount,email\n1,ten,a@example.com\n2,2.5,not-an-email\n";

    let (passed, report) = validate(content, &config, EngineChoice::Auto, dir.path());
    assert!(passed);
    assert!(report.findings.is_empty());
    let kinds: Vec<FindingKind> = report.advisories.iter().map(|a| a.kind).collect();
    assert!(kinds.contains(&FindingKind::TypeMismatch));
    assert!(kinds.contains(&FindingKind::FormatViolation));
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_ragged_rows_are_input_errors() {
    let dir = tempfile::tempdir().unwrap();
    let file = create_test_file("id,amount,customer\n1,10\n");
    let options = ValidationOptions::new(dir.path());
    let err = run_validation(file.path(), &orders_config(), &options).unwrap_err();
    assert!(matches!(err, EtlError::Input { .. }));
}

#[test]
fn test_missing_dataset_is_input_error() {
    let dir = tempfile::tempdir().unwrap();
    let options = ValidationOptions::new(dir.path());
    let err = run_validation(dir.path().join("absent.csv"), &orders_config(), &options)
        .unwrap_err();
    assert!(matches!(err, EtlError::Input { .. } | EtlError::Io { .. }));
}

#[test]
fn test_required_outside_columns_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = IngestionConfig::new(["id"], ["customer"], ["id"]);
    let file = create_test_file("id\n1\n");
    let err = run_validation(file.path(), &config, &ValidationOptions::new(dir.path()))
        .unwrap_err();
    assert!(matches!(err, EtlError::Config(_)));
}

// =============================================================================
// Report Artifact
// =============================================================================

#[test]
fn test_report_artifact_written_for_failures() {
    let dir = tempfile::tempdir().unwrap();
    let config = IngestionConfig::new(["id", "amount"], ["id"], ["id"]);
    let (passed, report) = validate("id,amount\n1,1\n1,2\n", &config, EngineChoice::Auto, dir.path());
    assert!(!passed);

    let reports = list_reports(dir.path()).unwrap();
    assert_eq!(reports.len(), 1);
    let name = reports[0].file_name().unwrap().to_string_lossy().to_string();
    assert!(name.ends_with("_result.json"));
    assert_eq!(name, report.file_name());
    assert_eq!(report.artifact.as_ref(), Some(&reports[0]));

    let loaded = ValidationReport::load(&reports[0]).unwrap();
    assert_eq!(loaded.passed, report.passed);
    assert_eq!(loaded.findings, report.findings);
    assert_eq!(loaded.input.hash, report.input.hash);
}
