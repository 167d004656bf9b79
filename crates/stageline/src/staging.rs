//! `SQLite`-backed staging store.
//!
//! Holds the raw loaded table plus whatever transform scripts create. The
//! connection closes when the store is dropped.

use std::path::{Path, PathBuf};

use rusqlite::types::Value;
use rusqlite::{Connection, params_from_iter};

use crate::error::{EtlError, Result};
use crate::input::DataTable;

/// Quote an identifier for use in SQL text.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Storage class chosen for a loaded column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Affinity {
    Integer,
    Real,
    Text,
}

impl Affinity {
    fn infer<'a>(values: impl Iterator<Item = &'a str>) -> Self {
        let mut affinity = Affinity::Integer;
        for value in values.filter(|v| !DataTable::is_null_value(v)) {
            let v = value.trim();
            match affinity {
                Affinity::Integer if v.parse::<i64>().is_ok() => {}
                Affinity::Integer | Affinity::Real if v.parse::<f64>().is_ok() => {
                    affinity = Affinity::Real
                }
                _ => return Affinity::Text,
            }
        }
        affinity
    }

    fn sql_type(self) -> &'static str {
        match self {
            Affinity::Integer => "INTEGER",
            Affinity::Real => "REAL",
            Affinity::Text => "TEXT",
        }
    }

    fn value(self, raw: &str) -> Value {
        if DataTable::is_null_value(raw) {
            return Value::Null;
        }
        let v = raw.trim();
        match self {
            Affinity::Integer => v.parse().map(Value::Integer).unwrap_or(Value::Null),
            Affinity::Real => v.parse().map(Value::Real).unwrap_or(Value::Null),
            Affinity::Text => Value::Text(raw.to_string()),
        }
    }
}

/// Handle on the staging database.
pub struct StagingStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl StagingStore {
    /// Open or create the staging database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| EtlError::io(parent, e))?;
        }
        let conn = Connection::open(path)?;
        tracing::debug!(path = %path.display(), "opened staging store");
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// In-memory store, for tests and previews.
    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            path: None,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Drop and recreate `name` from `table`, inferring INTEGER/REAL/TEXT per
    /// column. Null cells are stored as NULL. Returns the rows written.
    pub fn replace_table(&mut self, name: &str, table: &DataTable) -> Result<usize> {
        let affinities: Vec<Affinity> = (0..table.column_count())
            .map(|i| Affinity::infer(table.column_values(i)))
            .collect();

        let columns = table
            .headers
            .iter()
            .zip(&affinities)
            .map(|(h, a)| format!("{} {}", quote_ident(h), a.sql_type()))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; table.column_count()].join(", ");
        let ident = quote_ident(name);

        let tx = self.conn.transaction()?;
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {ident};\nCREATE TABLE {ident} ({columns});"
        ))?;
        {
            let mut stmt = tx.prepare(&format!("INSERT INTO {ident} VALUES ({placeholders})"))?;
            for row in &table.rows {
                let values = row.iter().zip(&affinities).map(|(raw, a)| a.value(raw));
                stmt.execute(params_from_iter(values))?;
            }
        }
        tx.commit()?;

        tracing::info!(table = name, rows = table.row_count(), "loaded staging table");
        Ok(table.row_count())
    }

    /// Run a batch of statements in autocommit mode.
    pub fn execute_script(&self, sql: &str) -> rusqlite::Result<()> {
        self.conn.execute_batch(sql)
    }

    /// User tables, sorted by name.
    pub fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }

    pub fn row_count(&self, table: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_ident(table)),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Every row of `table` in storage order.
    pub fn table_rows(&self, table: &str) -> Result<Vec<Vec<Value>>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT * FROM {}", quote_ident(table)))?;
        let width = stmt.column_count();
        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|i| row.get::<_, Value>(i))
                    .collect::<rusqlite::Result<Vec<Value>>>()
            })?
            .collect::<rusqlite::Result<Vec<Vec<Value>>>>()?;
        Ok(rows)
    }

    /// Close the connection, surfacing any error instead of dropping it.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| EtlError::Database(e))
    }
}
