//! Ingestion config: the declarative document describing expected columns,
//! required fields and unique keys.
//!
//! ```yaml
//! columns:
//!   - transaction_id
//!   - name: amount
//!     type: float
//! required: [transaction_id]
//! unique_keys: [transaction_id]
//! validations:
//!   Email: email
//!   Date: "%Y-%m-%d"
//! ```

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::format::{Item, StrftimeItems};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::error::{EtlError, Result};

/// Declared type of a column, used for advisory coercion checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    #[default]
    String,
    Integer,
    Float,
    Timestamp,
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "string" | "str" | "text" | "object" => Ok(ColumnType::String),
            "int" | "integer" => Ok(ColumnType::Integer),
            "float" | "numeric" | "number" => Ok(ColumnType::Float),
            "timestamp" | "datetime" | "date" => Ok(ColumnType::Timestamp),
            other => Err(format!("unknown column type '{}'", other)),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::String => write!(f, "string"),
            ColumnType::Integer => write!(f, "integer"),
            ColumnType::Float => write!(f, "float"),
            ColumnType::Timestamp => write!(f, "timestamp"),
        }
    }
}

/// An expected column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: ColumnType::String,
        }
    }

    pub fn typed(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Columns checked by name whenever they are present.
const DEFAULT_FORMAT_RULES: &[(&str, &str)] =
    &[("Email", "email"), ("Date", "%Y-%m-%d"), ("Time", "%H:%M:%S")];

/// Strict format rule applied to every value of a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatRule {
    Email,
    /// chrono strftime pattern, e.g. `%Y-%m-%d` or `%H:%M:%S`.
    Pattern(String),
}

impl FormatRule {
    fn parse(column: &str, raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(EtlError::Config(format!(
                "validations.{}: rule must not be empty",
                column
            )));
        }
        if raw.eq_ignore_ascii_case("email") {
            return Ok(FormatRule::Email);
        }
        if StrftimeItems::new(raw).any(|item| matches!(item, Item::Error)) {
            return Err(EtlError::Config(format!(
                "validations.{}: invalid format '{}'",
                column, raw
            )));
        }
        Ok(FormatRule::Pattern(raw.to_string()))
    }
}

impl fmt::Display for FormatRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatRule::Email => write!(f, "email"),
            FormatRule::Pattern(p) => write!(f, "{}", p),
        }
    }
}

/// Loaded ingestion config. Immutable for the duration of a validation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestionConfig {
    pub columns: Vec<ColumnSpec>,
    pub required: Vec<String>,
    pub unique_keys: Vec<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub validations: IndexMap<String, FormatRule>,
}

impl IngestionConfig {
    /// Build a config of untyped columns.
    pub fn new<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        required: impl IntoIterator<Item = S>,
        unique_keys: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            columns: columns.into_iter().map(ColumnSpec::new).collect(),
            required: required.into_iter().map(Into::into).collect(),
            unique_keys: unique_keys.into_iter().map(Into::into).collect(),
            validations: IndexMap::new(),
        }
    }

    /// Add a format rule for a column.
    pub fn with_validation(mut self, column: impl Into<String>, rule: FormatRule) -> Self {
        self.validations.insert(column.into(), rule);
        self
    }

    /// Set the declared type of an existing column.
    pub fn with_type(mut self, column: &str, column_type: ColumnType) -> Self {
        if let Some(spec) = self.columns.iter_mut().find(|c| c.name == column) {
            spec.column_type = column_type;
        }
        self
    }

    /// Load and check a config document from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            EtlError::Config(format!(
                "cannot read ingestion config '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml_str(&text)
    }

    /// Parse and check a config document.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(text)?;
        Self::from_value(&value)
    }

    fn from_value(value: &Value) -> Result<Self> {
        let map = value.as_mapping().ok_or_else(|| {
            EtlError::Config("ingestion config must be a key-value document".to_string())
        })?;

        let columns = require_key(map, "columns")?;
        let columns = as_sequence("columns", columns)?
            .iter()
            .enumerate()
            .map(|(i, item)| parse_column(i, item))
            .collect::<Result<Vec<_>>>()?;

        let required = string_list("required", require_key(map, "required")?)?;
        let unique_keys = string_list("unique_keys", require_key(map, "unique_keys")?)?;

        let mut validations = IndexMap::new();
        match map.get("validations") {
            None | Some(Value::Null) => {}
            Some(Value::Mapping(rules)) => {
                for (k, v) in rules {
                    let (Some(column), Some(rule)) = (k.as_str(), v.as_str()) else {
                        return Err(EtlError::Config(
                            "validations must map column names to rule strings".to_string(),
                        ));
                    };
                    validations.insert(column.to_string(), FormatRule::parse(column, rule)?);
                }
            }
            Some(_) => {
                return Err(EtlError::Config(
                    "validations must be a mapping".to_string(),
                ));
            }
        }

        let config = Self {
            columns,
            required,
            unique_keys,
            validations,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check internal consistency. Called before any row is processed.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for column in &self.columns {
            if column.name.trim().is_empty() {
                return Err(EtlError::Config(
                    "columns: column names must not be empty".to_string(),
                ));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(EtlError::Config(format!(
                    "columns: '{}' is declared more than once",
                    column.name
                )));
            }
        }

        for (key, names) in [("required", &self.required), ("unique_keys", &self.unique_keys)] {
            for name in names {
                if !seen.contains(name.as_str()) {
                    return Err(EtlError::Config(format!(
                        "{}: '{}' is not listed in columns",
                        key, name
                    )));
                }
            }
        }

        if let Some(column) = self.validations.keys().find(|c| c.trim().is_empty()) {
            return Err(EtlError::Config(format!(
                "validations: invalid column name '{}'",
                column
            )));
        }

        Ok(())
    }

    /// Names in `columns` order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Every column the dataset must carry: `columns`, then `required`, then
    /// `unique_keys`, deduplicated in first-mention order.
    pub fn expected_columns(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.column_names()
            .chain(self.required.iter().map(String::as_str))
            .chain(self.unique_keys.iter().map(String::as_str))
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Columns with a declared non-string type.
    pub fn typed_columns(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.columns
            .iter()
            .filter(|c| c.column_type != ColumnType::String)
    }

    /// Format rules to apply: the built-in `Email`, `Date` (`%Y-%m-%d`) and
    /// `Time` (`%H:%M:%S`) checks, overridden or extended by `validations`.
    pub fn format_rules(&self) -> IndexMap<&str, FormatRule> {
        let mut rules: IndexMap<&str, FormatRule> = DEFAULT_FORMAT_RULES
            .iter()
            .map(|(column, rule)| {
                let rule = match *rule {
                    "email" => FormatRule::Email,
                    pattern => FormatRule::Pattern(pattern.to_string()),
                };
                (*column, rule)
            })
            .collect();
        for (column, rule) in &self.validations {
            rules.insert(column.as_str(), rule.clone());
        }
        rules
    }

    /// Number of rules a validation run evaluates.
    pub fn rule_count(&self) -> usize {
        self.expected_columns().len()
            + self.required.len()
            + self.unique_keys.len()
            + self.typed_columns().count()
            + self.validations.len()
    }
}

fn require_key<'a>(map: &'a Mapping, key: &str) -> Result<&'a Value> {
    map.get(key)
        .ok_or_else(|| EtlError::Config(format!("missing required key '{}'", key)))
}

fn as_sequence<'a>(key: &str, value: &'a Value) -> Result<&'a [Value]> {
    match value {
        Value::Sequence(seq) => Ok(seq.as_slice()),
        Value::Null => Ok(&[]),
        _ => Err(EtlError::Config(format!("'{}' must be a sequence", key))),
    }
}

fn string_list(key: &str, value: &Value) -> Result<Vec<String>> {
    as_sequence(key, value)?
        .iter()
        .map(|item| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                EtlError::Config(format!("'{}' must contain only strings", key))
            })
        })
        .collect()
}

fn parse_column(index: usize, item: &Value) -> Result<ColumnSpec> {
    match item {
        Value::String(name) => Ok(ColumnSpec::new(name.clone())),
        Value::Mapping(entry) => {
            let name = entry.get("name").and_then(Value::as_str).ok_or_else(|| {
                EtlError::Config(format!("columns[{}]: missing 'name'", index))
            })?;
            let column_type = match entry.get("type") {
                None | Some(Value::Null) => ColumnType::String,
                Some(Value::String(t)) => t
                    .parse()
                    .map_err(|e| EtlError::Config(format!("columns[{}]: {}", index, e)))?,
                Some(_) => {
                    return Err(EtlError::Config(format!(
                        "columns[{}]: 'type' must be a string",
                        index
                    )));
                }
            };
            Ok(ColumnSpec::typed(name, column_type))
        }
        _ => Err(EtlError::Config(format!(
            "columns[{}]: expected a name or a {{name, type}} mapping",
            index
        ))),
    }
}
