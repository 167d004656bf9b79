//! Transform runner: load the staged CSV, then run every script in order.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::scripts::discover_scripts;
use crate::error::{EtlError, Result};
use crate::input::Parser;
use crate::settings::Settings;
use crate::staging::StagingStore;

/// What a successful run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformSummary {
    pub raw_table: String,
    pub rows_loaded: usize,
    /// Executed scripts, in execution order.
    pub scripts: Vec<String>,
}

/// Runs transform scripts against one staging database.
#[derive(Debug, Clone)]
pub struct TransformRunner {
    staging_db: PathBuf,
    scripts_dir: PathBuf,
    raw_table: String,
}

impl TransformRunner {
    pub fn new(staging_db: impl Into<PathBuf>, scripts_dir: impl Into<PathBuf>) -> Self {
        Self {
            staging_db: staging_db.into(),
            scripts_dir: scripts_dir.into(),
            raw_table: "transactions".to_string(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.staging_db_path(), settings.transforms_dir_path())
            .with_raw_table(settings.raw_table.clone())
    }

    /// Table the staged CSV is loaded into.
    pub fn with_raw_table(mut self, name: impl Into<String>) -> Self {
        self.raw_table = name.into();
        self
    }

    /// Replace the raw table with `staged_csv`, then execute each script as
    /// one batch. Stops at the first failing script; earlier scripts stay
    /// committed.
    pub fn run(&self, staged_csv: impl AsRef<Path>) -> Result<TransformSummary> {
        let staged_csv = staged_csv.as_ref();
        if !staged_csv.exists() {
            return Err(EtlError::input(
                staged_csv,
                "staged CSV not found; run ingest first",
            ));
        }

        let scripts = discover_scripts(&self.scripts_dir)?;
        let (table, _) = Parser::new().parse_file(staged_csv)?;

        let mut store = StagingStore::open(&self.staging_db)?;
        let rows_loaded = store.replace_table(&self.raw_table, &table)?;

        let mut executed = Vec::with_capacity(scripts.len());
        for script in &scripts {
            let sql = script.read_sql()?;
            tracing::info!(script = %script.name, "running transform");
            store.execute_script(&sql).map_err(|source| {
                tracing::error!(script = %script.name, error = %source, "transform failed");
                EtlError::Transform {
                    script: script.name.clone(),
                    source,
                }
            })?;
            executed.push(script.name.clone());
        }

        store.close()?;

        tracing::info!(
            db = %self.staging_db.display(),
            scripts = executed.len(),
            "transforms completed"
        );

        Ok(TransformSummary {
            raw_table: self.raw_table.clone(),
            rows_loaded,
            scripts: executed,
        })
    }
}

/// Load `staged_csv` into `staging_db` and run the scripts in `scripts_dir`.
pub fn run_transforms(
    staged_csv: impl AsRef<Path>,
    staging_db: impl AsRef<Path>,
    scripts_dir: impl AsRef<Path>,
) -> Result<TransformSummary> {
    TransformRunner::new(staging_db.as_ref(), scripts_dir.as_ref()).run(staged_csv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_staged_csv_is_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_transforms(
            dir.path().join("staged.csv"),
            dir.path().join("staging.db"),
            dir.path(),
        )
        .unwrap_err();
        assert!(matches!(err, EtlError::Input { .. }));
    }

    #[test]
    fn test_runs_scripts_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("staged.csv");
        fs::write(&csv, "id,amount\n1,10\n2,20\n").unwrap();
        let sql = dir.path().join("sql");
        fs::create_dir(&sql).unwrap();
        fs::write(
            sql.join("02_total.sql"),
            "DROP TABLE IF EXISTS total; CREATE TABLE total AS SELECT SUM(amount) AS s FROM doubled;",
        )
        .unwrap();
        fs::write(
            sql.join("01_double.sql"),
            "DROP TABLE IF EXISTS doubled; CREATE TABLE doubled AS SELECT id, amount * 2 AS amount FROM orders;",
        )
        .unwrap();

        let db = dir.path().join("data/staging.db");
        let summary = TransformRunner::new(&db, &sql)
            .with_raw_table("orders")
            .run(&csv)
            .unwrap();

        assert_eq!(summary.rows_loaded, 2);
        assert_eq!(summary.scripts, vec!["01_double.sql", "02_total.sql"]);

        let store = StagingStore::open(&db).unwrap();
        let total: i64 = store
            .connection()
            .query_row("SELECT s FROM total", [], |r| r.get(0))
            .unwrap();
        assert_eq!(total, 60);
    }
}
