//! In-process validation engine. Always available.

use indexmap::IndexMap;

use super::Validator;
use super::finding::Finding;
use crate::config::IngestionConfig;
use crate::error::Result;
use crate::input::DataTable;

/// Row-scanning validator over the parsed table.
#[derive(Debug, Clone, Copy, Default)]
pub struct LightweightValidator;

impl Validator for LightweightValidator {
    fn name(&self) -> &'static str {
        "lightweight"
    }

    fn check(&self, table: &DataTable, config: &IngestionConfig) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();

        for column in config.expected_columns() {
            if table.column_index(column).is_none() {
                findings.push(Finding::missing_column(column));
            }
        }

        findings.extend(self.find_nulls(table, config));
        findings.extend(self.find_duplicates(table, config));

        Ok(findings)
    }
}

impl LightweightValidator {
    /// Row-major scan of required columns.
    fn find_nulls(&self, table: &DataTable, config: &IngestionConfig) -> Vec<Finding> {
        let required: Vec<(&str, usize)> = config
            .required
            .iter()
            .filter_map(|name| Some((name.as_str(), table.column_index(name)?)))
            .collect();

        let mut findings = Vec::new();
        for (row_idx, row) in table.rows.iter().enumerate() {
            for &(name, col) in &required {
                let value = row.get(col).map(String::as_str).unwrap_or("");
                if DataTable::is_null_value(value) {
                    findings.push(Finding::null_in_required(
                        name,
                        row_idx,
                        table.key_values(row_idx, &config.unique_keys),
                    ));
                }
            }
        }
        findings
    }

    /// Groups key values in first-occurrence order. All null cells share the
    /// `None` group.
    fn find_duplicates(&self, table: &DataTable, config: &IngestionConfig) -> Vec<Finding> {
        let mut findings = Vec::new();

        for key in &config.unique_keys {
            let Some(index) = table.column_index(key) else {
                continue;
            };

            let mut value_rows: IndexMap<Option<&str>, Vec<usize>> = IndexMap::new();
            for (row_idx, value) in table.column_values(index).enumerate() {
                let group = (!DataTable::is_null_value(value)).then_some(value);
                value_rows.entry(group).or_default().push(row_idx);
            }

            findings.extend(
                value_rows
                    .into_iter()
                    .filter(|(_, rows)| rows.len() > 1)
                    .map(|(value, rows)| match value {
                        Some(value) => Finding::duplicate_key(key, value, rows),
                        None => Finding::duplicate_null_key(key, rows),
                    }),
            );
        }

        findings
    }
}
