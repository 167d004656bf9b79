//! Transform script discovery.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{EtlError, Result};

/// A discovered `.sql` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformScript {
    /// File name; the ordering key.
    pub name: String,
    pub path: PathBuf,
}

impl TransformScript {
    /// Read the script's SQL text.
    pub fn read_sql(&self) -> Result<String> {
        fs::read_to_string(&self.path).map_err(|e| EtlError::io(&self.path, e))
    }
}

fn is_sql_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("sql"))
}

/// List the `.sql` files in `dir`, sorted by file name byte order.
///
/// Callers control execution order with numeric prefixes (`01_`, `02_`, ...).
pub fn discover_scripts(dir: impl AsRef<Path>) -> Result<Vec<TransformScript>> {
    let dir = dir.as_ref();

    let mut scripts: Vec<TransformScript> = fs::read_dir(dir)
        .map_err(|e| EtlError::io(dir, e))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_sql_file(path))
        .filter_map(|path| {
            let name = path.file_name()?.to_str()?.to_string();
            Some(TransformScript { name, path })
        })
        .collect();

    scripts.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));
    Ok(scripts)
}
