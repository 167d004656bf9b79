//! Finding types for rule violations.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Rule that produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// A configured column is absent from the header.
    MissingColumn,
    /// A required column is null on a row.
    NullInRequired,
    /// A unique-key value appears on more than one row.
    DuplicateKey,
    /// Values do not coerce to the declared column type (advisory).
    TypeMismatch,
    /// Values do not match a strict format rule (advisory).
    FormatViolation,
}

impl FindingKind {
    /// Get a human-readable label for the finding kind.
    pub fn label(&self) -> &'static str {
        match self {
            FindingKind::MissingColumn => "Missing Column",
            FindingKind::NullInRequired => "Null In Required",
            FindingKind::DuplicateKey => "Duplicate Key",
            FindingKind::TypeMismatch => "Type Mismatch",
            FindingKind::FormatViolation => "Format Violation",
        }
    }

    /// Whether findings of this kind fail a validation run.
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            FindingKind::MissingColumn | FindingKind::NullInRequired | FindingKind::DuplicateKey
        )
    }
}

/// A single rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    /// Affected column name.
    pub column: String,
    /// 0-based row positions involved.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub rows: Vec<usize>,
    /// The offending value, when there is one.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub value: Option<String>,
    /// Unique-key values of the offending row.
    #[serde(skip_serializing_if = "IndexMap::is_empty", default)]
    pub keys: IndexMap<String, String>,
    /// Number of offending values, when only a sample of rows is listed.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub count: Option<usize>,
    /// Human-readable description.
    pub detail: String,
}

impl Finding {
    /// Create a new finding.
    pub fn new(kind: FindingKind, column: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            column: column.into(),
            rows: Vec::new(),
            value: None,
            keys: IndexMap::new(),
            count: None,
            detail: detail.into(),
        }
    }

    pub fn missing_column(column: &str) -> Self {
        Self::new(
            FindingKind::MissingColumn,
            column,
            format!("column '{}' is not present in the header", column),
        )
    }

    pub fn null_in_required(column: &str, row: usize, keys: IndexMap<String, String>) -> Self {
        Self::new(
            FindingKind::NullInRequired,
            column,
            format!("required column '{}' is null on row {}", column, row),
        )
        .with_rows(vec![row])
        .with_keys(keys)
    }

    pub fn duplicate_key(column: &str, value: &str, rows: Vec<usize>) -> Self {
        let detail = format!(
            "value '{}' of unique key '{}' appears on {} rows",
            value,
            column,
            rows.len()
        );
        Self::new(FindingKind::DuplicateKey, column, detail)
            .with_value(value)
            .with_rows(rows)
    }

    /// Null cells repeated in a unique key. Every null spelling counts as one
    /// value, so the finding carries no `value`.
    pub fn duplicate_null_key(column: &str, rows: Vec<usize>) -> Self {
        let detail = format!(
            "null value of unique key '{}' appears on {} rows",
            column,
            rows.len()
        );
        Self::new(FindingKind::DuplicateKey, column, detail).with_rows(rows)
    }

    /// Set the row positions.
    pub fn with_rows(mut self, rows: Vec<usize>) -> Self {
        self.rows = rows;
        self
    }

    /// Set the offending value.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set the key values.
    pub fn with_keys(mut self, keys: IndexMap<String, String>) -> Self {
        self.keys = keys;
        self
    }

    /// Set the offending count.
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}
