//! Load staging tables into a target `SQLite` database.

use std::path::{Path, PathBuf};

use rusqlite::params;
use serde::Serialize;

use crate::error::{EtlError, Result};
use crate::staging::{StagingStore, quote_ident};

/// One copied table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadedTable {
    pub name: String,
    pub rows: usize,
}

/// Result of a load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub target: PathBuf,
    pub tables: Vec<LoadedTable>,
}

/// Copy `tables` (every staging table when empty) from `staging_db` into
/// `target_db`, replacing any existing copy. Each table is copied in its own
/// transaction.
pub fn load_to_target(
    staging_db: impl AsRef<Path>,
    target_db: impl AsRef<Path>,
    tables: &[String],
) -> Result<LoadSummary> {
    let staging_db = staging_db.as_ref();
    let target_db = target_db.as_ref();

    if !staging_db.is_file() {
        return Err(EtlError::input(
            staging_db,
            "staging database not found; run transform first",
        ));
    }

    let store = StagingStore::open(staging_db)?;
    let available = store.table_names()?;

    let selected: Vec<String> = if tables.is_empty() {
        available
    } else {
        if let Some(unknown) = tables.iter().find(|t| !available.contains(t)) {
            return Err(EtlError::Config(format!(
                "table '{}' does not exist in the staging store",
                unknown
            )));
        }
        tables.to_vec()
    };

    if let Some(parent) = target_db.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| EtlError::io(parent, e))?;
    }

    let conn = store.connection();
    conn.execute(
        "ATTACH DATABASE ?1 AS target",
        params![target_db.to_string_lossy()],
    )?;

    let mut loaded = Vec::with_capacity(selected.len());
    for name in &selected {
        let ident = quote_ident(name);
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS target.{ident};\n\
             CREATE TABLE target.{ident} AS SELECT * FROM main.{ident};"
        ))?;
        let rows: i64 =
            tx.query_row(&format!("SELECT COUNT(*) FROM target.{ident}"), [], |r| r.get(0))?;
        tx.commit()?;

        tracing::info!(table = %name, rows, "loaded table into target");
        loaded.push(LoadedTable {
            name: name.clone(),
            rows: rows as usize,
        });
    }

    conn.execute_batch("DETACH DATABASE target;")?;
    store.close()?;

    Ok(LoadSummary {
        target: target_db.to_path_buf(),
        tables: loaded,
    })
}
