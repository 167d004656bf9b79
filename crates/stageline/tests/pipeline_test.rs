//! End-to-end tests over the bundled retail demo project.

use std::fs;
use std::path::{Path, PathBuf};

use stageline::{
    IngestionConfig, Pipeline, Settings, Stage, StageStatus, StagingStore, list_reports,
};

fn demo_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/retail")
}

fn copy_dir(src: &Path, dest: &Path) {
    fs::create_dir_all(dest).unwrap();
    for entry in fs::read_dir(src).unwrap() {
        let entry = entry.unwrap();
        let target = dest.join(entry.file_name());
        if entry.file_type().unwrap().is_dir() {
            copy_dir(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), &target).unwrap();
        }
    }
}

/// Copy the demo project into a scratch directory so runs do not touch it.
fn scratch_project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    copy_dir(&demo_root(), dir.path());
    dir
}

// =============================================================================
// Demo Project
// =============================================================================

#[test]
fn test_demo_config_loads() {
    let config = IngestionConfig::load(demo_root().join("configs/ingestion_config.yml")).unwrap();
    assert_eq!(config.unique_keys, vec!["transaction_id"]);
    assert_eq!(config.validations.len(), 2);
}

#[test]
fn test_demo_pipeline_runs_end_to_end() {
    let project = scratch_project();
    let settings = Settings::load(project.path()).unwrap();
    let config = IngestionConfig::load(settings.ingestion_config_path()).unwrap();
    let src = project.path().join("sample_data/sample_transactions.csv");

    let report = Pipeline::new(settings.clone(), config).run(&src);

    assert!(report.succeeded(), "{:?}", report.outcomes);
    let validation = report.validation.as_ref().unwrap();
    assert!(validation.findings.is_empty());
    assert!(validation.advisories.is_empty(), "{:?}", validation.advisories);
    assert_eq!(
        report.transform.as_ref().unwrap().scripts,
        vec!["01_customer_summary.sql", "02_daily_sales.sql"]
    );
    assert_eq!(list_reports(settings.results_dir_path()).unwrap().len(), 1);

    let target = settings.target_db_path().unwrap();
    let warehouse = StagingStore::open(&target).unwrap();
    assert_eq!(warehouse.row_count("customer_summary").unwrap(), 4);
    assert_eq!(warehouse.row_count("transactions").unwrap(), 6);
}

#[test]
fn test_demo_pipeline_is_repeatable() {
    let project = scratch_project();
    let settings = Settings::load(project.path()).unwrap();
    let config = IngestionConfig::load(settings.ingestion_config_path()).unwrap();
    let src = project.path().join("sample_data/sample_transactions.csv");
    let pipeline = Pipeline::new(settings.clone(), config);

    assert!(pipeline.run(&src).succeeded());
    let store = StagingStore::open(settings.staging_db_path()).unwrap();
    let first = store.table_rows("daily_sales").unwrap();
    drop(store);

    assert!(pipeline.run(&src).succeeded());
    let store = StagingStore::open(settings.staging_db_path()).unwrap();
    assert_eq!(store.table_rows("daily_sales").unwrap(), first);
}

#[test]
fn test_bad_rows_stop_before_transform() {
    let project = scratch_project();
    let settings = Settings::load(project.path()).unwrap();
    let config = IngestionConfig::load(settings.ingestion_config_path()).unwrap();
    let src = project.path().join("bad.csv");
    fs::write(
        &src,
        "transaction_id,customer_id,email,transaction_date,quantity,unit_price,total_amount,category\n\
         T1,C1,a@example.com,2024-01-01,1,1.0,1.0,x\n\
         T1,,a@example.com,2024-01-02,1,1.0,1.0,x\n",
    )
    .unwrap();

    let report = Pipeline::new(settings.clone(), config).run(&src);

    let failed = report.failed_stage().unwrap();
    assert_eq!(failed.stage, Stage::Validate);
    assert_eq!(report.outcomes[2].status, StageStatus::Skipped);
    assert!(!settings.staging_db_path().exists());
}
