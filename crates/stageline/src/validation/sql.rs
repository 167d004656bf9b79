//! SQL expectation engine.
//!
//! Loads the dataset into an in-memory `SQLite` database and evaluates each
//! rule as a query. Cells that read as null are stored as SQL NULL, so the
//! engine agrees with [`LightweightValidator`](super::LightweightValidator)
//! on what counts as missing.
//!
//! `SQLite` identifiers are case-insensitive while CSV headers are not, so
//! dataset columns are stored by position (`c0`, `c1`, ...) and header names
//! live in a side table that is matched byte for byte.

use std::collections::HashMap;

use indexmap::IndexMap;
use rusqlite::types::Value;
use rusqlite::{Connection, params, params_from_iter};

use super::Validator;
use super::finding::Finding;
use crate::config::IngestionConfig;
use crate::error::Result;
use crate::input::DataTable;

const DATASET_TABLE: &str = "dataset";
const HEADER_TABLE: &str = "dataset_columns";
const ROW_COLUMN: &str = "ord";

/// Query-backed validator.
#[derive(Debug, Clone)]
pub struct SqlValidator {
    sqlite_version: String,
}

impl SqlValidator {
    /// Probe the runtime: the engine is available when an in-memory database
    /// opens and answers a version query.
    pub fn probe() -> Option<Self> {
        let version = Connection::open_in_memory()
            .and_then(|conn| conn.query_row("SELECT sqlite_version()", [], |row| row.get(0)));
        match version {
            Ok(sqlite_version) => Some(Self { sqlite_version }),
            Err(e) => {
                tracing::debug!(error = %e, "SQL validation engine probe failed");
                None
            }
        }
    }

    pub fn sqlite_version(&self) -> &str {
        &self.sqlite_version
    }
}

impl Validator for SqlValidator {
    fn name(&self) -> &'static str {
        "sql"
    }

    fn check(&self, table: &DataTable, config: &IngestionConfig) -> Result<Vec<Finding>> {
        let mut conn = Connection::open_in_memory()?;
        load_dataset(&mut conn, table)?;

        let positions = column_positions(&conn)?;
        let mut findings: Vec<Finding> = config
            .expected_columns()
            .into_iter()
            .filter(|c| !positions.contains_key(*c))
            .map(Finding::missing_column)
            .collect();

        let keys: Vec<(&str, String)> = config
            .unique_keys
            .iter()
            .filter_map(|k| Some((k.as_str(), column_ref(*positions.get(k)?))))
            .collect();

        findings.extend(null_findings(&conn, config, &positions, &keys)?);
        findings.extend(duplicate_findings(&conn, &keys)?);

        Ok(findings)
    }
}

/// Storage name of the column at `position`.
fn column_ref(position: usize) -> String {
    format!("c{}", position)
}

fn load_dataset(conn: &mut Connection, table: &DataTable) -> Result<()> {
    let columns: Vec<String> = std::iter::once(format!("{} INTEGER PRIMARY KEY", ROW_COLUMN))
        .chain((0..table.column_count()).map(|i| format!("{} TEXT", column_ref(i))))
        .collect();
    let placeholders = vec!["?"; table.column_count() + 1].join(", ");

    let tx = conn.transaction()?;
    tx.execute_batch(&format!(
        "CREATE TABLE {} ({});
         CREATE TABLE {} (name TEXT NOT NULL, position INTEGER NOT NULL);",
        DATASET_TABLE,
        columns.join(", "),
        HEADER_TABLE,
    ))?;
    {
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {} (name, position) VALUES (?1, ?2)",
            HEADER_TABLE
        ))?;
        for (position, name) in table.headers.iter().enumerate() {
            stmt.execute(params![name, position as i64])?;
        }

        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {} VALUES ({})",
            DATASET_TABLE, placeholders
        ))?;
        for (row_idx, row) in table.rows.iter().enumerate() {
            let cells = row.iter().map(|cell| {
                if DataTable::is_null_value(cell) {
                    Value::Null
                } else {
                    Value::Text(cell.clone())
                }
            });
            let values = std::iter::once(Value::Integer(row_idx as i64)).chain(cells);
            stmt.execute(params_from_iter(values))?;
        }
    }
    tx.commit()?;
    Ok(())
}

/// Header name to column position.
fn column_positions(conn: &Connection) -> Result<HashMap<String, usize>> {
    let mut stmt = conn.prepare(&format!("SELECT name, position FROM {}", HEADER_TABLE))?;
    let positions = stmt
        .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
        })?
        .collect::<rusqlite::Result<HashMap<String, usize>>>()?;
    Ok(positions)
}

/// One finding per null required cell, ordered by row then by the column's
/// position in `required`.
fn null_findings(
    conn: &Connection,
    config: &IngestionConfig,
    positions: &HashMap<String, usize>,
    keys: &[(&str, String)],
) -> Result<Vec<Finding>> {
    let key_select: String = keys.iter().map(|(_, col)| format!(", {}", col)).collect();

    let mut located: Vec<(usize, usize, Finding)> = Vec::new();
    for (position, column) in config.required.iter().enumerate() {
        let Some(&index) = positions.get(column) else {
            continue;
        };
        let sql = format!(
            "SELECT {row}{keys} FROM {table} WHERE {col} IS NULL ORDER BY {row}",
            row = ROW_COLUMN,
            keys = key_select,
            table = DATASET_TABLE,
            col = column_ref(index),
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            let ordinal: i64 = row.get(0)?;
            let mut key_values = IndexMap::new();
            for (i, (key, _)) in keys.iter().enumerate() {
                if let Some(v) = row.get::<_, Option<String>>(i + 1)? {
                    key_values.insert((*key).to_string(), v);
                }
            }
            Ok((ordinal as usize, key_values))
        })?;
        for row in rows {
            let (ordinal, key_values) = row?;
            located.push((
                ordinal,
                position,
                Finding::null_in_required(column, ordinal, key_values),
            ));
        }
    }

    located.sort_by_key(|(row, position, _)| (*row, *position));
    Ok(located.into_iter().map(|(_, _, f)| f).collect())
}

/// One finding per repeated value, in first-occurrence order. `GROUP BY`
/// puts every NULL in one group, matching the lightweight engine.
fn duplicate_findings(conn: &Connection, keys: &[(&str, String)]) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();

    for (key, col) in keys {
        let mut groups = conn.prepare(&format!(
            "SELECT {col}, MIN({ROW_COLUMN}) AS first_row FROM {DATASET_TABLE} \
             GROUP BY {col} HAVING COUNT(*) > 1 ORDER BY first_row"
        ))?;
        let values = groups
            .query_map([], |r| r.get::<_, Option<String>>(0))?
            .collect::<rusqlite::Result<Vec<Option<String>>>>()?;

        let mut members = conn.prepare(&format!(
            "SELECT {ROW_COLUMN} FROM {DATASET_TABLE} WHERE {col} IS ?1 ORDER BY {ROW_COLUMN}"
        ))?;
        for value in values {
            let rows = members
                .query_map(params![value], |r| r.get::<_, i64>(0))?
                .map(|r| r.map(|n| n as usize))
                .collect::<rusqlite::Result<Vec<usize>>>()?;
            findings.push(match value {
                Some(value) => Finding::duplicate_key(key, &value, rows),
                None => Finding::duplicate_null_key(key, rows),
            });
        }
    }

    Ok(findings)
}
