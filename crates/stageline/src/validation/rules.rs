//! Advisory type and format checks.
//!
//! These run identically under every engine and never fail a run; their
//! findings land in the report's advisory list.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

use super::finding::{Finding, FindingKind};
use crate::config::{ColumnType, FormatRule, IngestionConfig};
use crate::input::DataTable;

/// Rows listed per advisory.
const MAX_SAMPLE_ROWS: usize = 10;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email regex")
});

/// Timestamp layouts accepted for `timestamp` columns, besides RFC 3339.
const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Run every advisory check configured for columns present in the table.
pub fn advisories(table: &DataTable, config: &IngestionConfig) -> Vec<Finding> {
    let mut findings = Vec::new();

    for spec in config.typed_columns() {
        let Some(index) = table.column_index(&spec.name) else {
            continue;
        };
        let bad: Vec<(usize, &str)> = table
            .column_values(index)
            .enumerate()
            .filter(|(_, v)| !DataTable::is_null_value(v) && !coerces_to(v, spec.column_type))
            .collect();
        if let Some(finding) = summarize(
            FindingKind::TypeMismatch,
            &spec.name,
            &bad,
            &format!("not convertible to {}", spec.column_type),
        ) {
            findings.push(finding);
        }
    }

    for (column, rule) in config.format_rules() {
        let Some(index) = table.column_index(column) else {
            continue;
        };
        let bad: Vec<(usize, &str)> = table
            .column_values(index)
            .enumerate()
            .filter(|(_, v)| DataTable::is_null_value(v) || !matches_format(v, &rule))
            .collect();
        if let Some(finding) = summarize(
            FindingKind::FormatViolation,
            column,
            &bad,
            &format!("not matching format '{}'", rule),
        ) {
            findings.push(finding);
        }
    }

    findings
}

fn summarize(
    kind: FindingKind,
    column: &str,
    bad: &[(usize, &str)],
    what: &str,
) -> Option<Finding> {
    let (_, first) = bad.first()?;
    let rows = bad.iter().take(MAX_SAMPLE_ROWS).map(|(row, _)| *row).collect();
    Some(
        Finding::new(
            kind,
            column,
            format!("{} value(s) in '{}' {}", bad.len(), column, what),
        )
        .with_rows(rows)
        .with_value(*first)
        .with_count(bad.len()),
    )
}

/// Whether a non-null value can be read as the given type.
pub fn coerces_to(value: &str, column_type: ColumnType) -> bool {
    let v = value.trim();
    match column_type {
        ColumnType::String => true,
        ColumnType::Integer => {
            v.parse::<i64>().is_ok()
                || v.parse::<f64>().is_ok_and(|f| f.is_finite() && f.fract() == 0.0)
        }
        ColumnType::Float => v.parse::<f64>().is_ok(),
        ColumnType::Timestamp => {
            DateTime::parse_from_rfc3339(v).is_ok()
                || TIMESTAMP_FORMATS
                    .iter()
                    .any(|f| NaiveDateTime::parse_from_str(v, f).is_ok())
                || DATE_FORMATS
                    .iter()
                    .any(|f| NaiveDate::parse_from_str(v, f).is_ok())
        }
    }
}

/// Whether a value satisfies a strict format rule.
pub fn matches_format(value: &str, rule: &FormatRule) -> bool {
    let v = value.trim();
    match rule {
        FormatRule::Email => EMAIL_RE.is_match(v),
        FormatRule::Pattern(fmt) => {
            NaiveDateTime::parse_from_str(v, fmt).is_ok()
                || NaiveDate::parse_from_str(v, fmt).is_ok()
                || NaiveTime::parse_from_str(v, fmt).is_ok()
        }
    }
}
