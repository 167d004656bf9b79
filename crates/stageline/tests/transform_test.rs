//! Integration tests for the transform runner and staging load.

use std::fs;
use std::path::{Path, PathBuf};

use stageline::{
    ErrorKind, EtlError, StagingStore, TransformRunner, discover_scripts, load_to_target,
    run_transforms,
};

struct Project {
    _dir: tempfile::TempDir,
    csv: PathBuf,
    db: PathBuf,
    scripts: PathBuf,
}

/// Helper to lay out a staged CSV and an empty scripts directory.
fn create_project(csv: &str) -> Project {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let csv_path = dir.path().join("data/staged.csv");
    fs::create_dir_all(csv_path.parent().unwrap()).unwrap();
    fs::write(&csv_path, csv).unwrap();
    let scripts = dir.path().join("sql/transforms");
    fs::create_dir_all(&scripts).unwrap();

    Project {
        db: dir.path().join("data/staging.db"),
        csv: csv_path,
        scripts,
        _dir: dir,
    }
}

fn write_script(dir: &Path, name: &str, sql: &str) {
    fs::write(dir.join(name), sql).expect("Failed to write script");
}

const TRANSACTIONS: &str = "id,customer,amount\n1,ann,10.5\n2,bob,20\n3,ann,4.5\n";

// =============================================================================
// Ordering
// =============================================================================

#[test]
fn test_scripts_run_in_name_order() {
    let project = create_project(TRANSACTIONS);
    let log = "CREATE TABLE IF NOT EXISTS run_log (seq INTEGER PRIMARY KEY, script TEXT);";
    for name in ["01_a.sql", "02_b.sql", "00_c.sql"] {
        write_script(
            &project.scripts,
            name,
            &format!("{log} INSERT INTO run_log (script) VALUES ('{name}');"),
        );
    }

    let summary = run_transforms(&project.csv, &project.db, &project.scripts).unwrap();
    assert_eq!(summary.scripts, vec!["00_c.sql", "01_a.sql", "02_b.sql"]);

    let store = StagingStore::open(&project.db).unwrap();
    let mut stmt = store
        .connection()
        .prepare("SELECT script FROM run_log ORDER BY seq")
        .unwrap();
    let executed: Vec<String> = stmt
        .query_map([], |r| r.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(executed, vec!["00_c.sql", "01_a.sql", "02_b.sql"]);
}

#[test]
fn test_discovery_ignores_non_sql_files() {
    let project = create_project(TRANSACTIONS);
    write_script(&project.scripts, "01_a.sql", "SELECT 1;");
    write_script(&project.scripts, "notes.txt", "not sql");

    let scripts = discover_scripts(&project.scripts).unwrap();
    assert_eq!(scripts.len(), 1);
    assert_eq!(scripts[0].name, "01_a.sql");
}

// =============================================================================
// Idempotence
// =============================================================================

#[test]
fn test_rerun_produces_identical_tables() {
    let project = create_project(TRANSACTIONS);
    write_script(
        &project.scripts,
        "01_customer_totals.sql",
        "DROP TABLE IF EXISTS customer_totals;\n\
         CREATE TABLE customer_totals AS\n\
         SELECT customer, SUM(amount) AS total FROM transactions GROUP BY customer ORDER BY customer;",
    );

    run_transforms(&project.csv, &project.db, &project.scripts).unwrap();
    let first = {
        let store = StagingStore::open(&project.db).unwrap();
        (
            store.table_rows("transactions").unwrap(),
            store.table_rows("customer_totals").unwrap(),
        )
    };

    run_transforms(&project.csv, &project.db, &project.scripts).unwrap();
    let store = StagingStore::open(&project.db).unwrap();
    assert_eq!(store.table_rows("transactions").unwrap(), first.0);
    assert_eq!(store.table_rows("customer_totals").unwrap(), first.1);
    assert_eq!(store.row_count("transactions").unwrap(), 3);
    assert_eq!(store.row_count("customer_totals").unwrap(), 2);
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_failing_script_is_named_and_halts() {
    let project = create_project(TRANSACTIONS);
    write_script(
        &project.scripts,
        "01_ok.sql",
        "DROP TABLE IF EXISTS first_pass; CREATE TABLE first_pass AS SELECT * FROM transactions;",
    );
    write_script(
        &project.scripts,
        "02_broken.sql",
        "CREATE TABLE broken AS SELECT * FROM no_such_table;",
    );
    write_script(
        &project.scripts,
        "03_never.sql",
        "CREATE TABLE never_run (x INTEGER);",
    );

    let err = run_transforms(&project.csv, &project.db, &project.scripts).unwrap_err();
    match &err {
        EtlError::Transform { script, .. } => assert_eq!(script, "02_broken.sql"),
        other => panic!("Expected transform error, got {:?}", other),
    }
    assert_eq!(err.kind(), ErrorKind::Transform);

    let store = StagingStore::open(&project.db).unwrap();
    let tables = store.table_names().unwrap();
    assert!(tables.contains(&"first_pass".to_string()));
    assert!(!tables.contains(&"never_run".to_string()));
}

#[test]
fn test_missing_scripts_dir() {
    let project = create_project(TRANSACTIONS);
    let err = run_transforms(&project.csv, &project.db, project.scripts.join("nope")).unwrap_err();
    assert!(matches!(err, EtlError::Io { .. }));
}

// =============================================================================
// Raw Table And Load
// =============================================================================

#[test]
fn test_custom_raw_table_and_load() {
    let project = create_project(TRANSACTIONS);
    write_script(
        &project.scripts,
        "01_big.sql",
        "DROP TABLE IF EXISTS big_orders; CREATE TABLE big_orders AS SELECT * FROM orders WHERE amount > 5;",
    );

    let summary = TransformRunner::new(&project.db, &project.scripts)
        .with_raw_table("orders")
        .run(&project.csv)
        .unwrap();
    assert_eq!(summary.raw_table, "orders");
    assert_eq!(summary.rows_loaded, 3);

    let target = project.db.with_file_name("target.db");
    let loaded = load_to_target(&project.db, &target, &["big_orders".to_string()]).unwrap();
    assert_eq!(loaded.tables.len(), 1);
    assert_eq!(loaded.tables[0].rows, 2);

    let target_store = StagingStore::open(&target).unwrap();
    assert_eq!(target_store.table_names().unwrap(), vec!["big_orders"]);
}
