//! Schema-driven validation of staged datasets.
//!
//! Two engines implement the [`Validator`] capability: the SQL expectation
//! engine (behind the `sql-engine` feature, probed at runtime) and the
//! always-available lightweight engine. Both report the same blocking
//! findings for the same input.

mod finding;
mod lightweight;
mod report;
pub mod rules;
#[cfg(feature = "sql-engine")]
mod sql;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use finding::{Finding, FindingKind};
pub use lightweight::LightweightValidator;
pub use report::{ReportStatistics, ValidationReport, list_reports};
#[cfg(feature = "sql-engine")]
pub use sql::SqlValidator;

use crate::config::IngestionConfig;
use crate::error::{EtlError, Result};
use crate::input::{DataTable, Parser};

/// A validation engine.
pub trait Validator {
    /// Engine name recorded in reports.
    fn name(&self) -> &'static str;

    /// Check a dataset and return its blocking findings.
    fn check(&self, table: &DataTable, config: &IngestionConfig) -> Result<Vec<Finding>>;
}

/// Which engine to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineChoice {
    /// SQL engine when available, lightweight otherwise.
    #[default]
    Auto,
    Lightweight,
    Sql,
}

impl FromStr for EngineChoice {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(EngineChoice::Auto),
            "lightweight" | "light" => Ok(EngineChoice::Lightweight),
            "sql" | "sqlite" => Ok(EngineChoice::Sql),
            _ => Err(format!(
                "Unknown engine: {}. Use: auto, lightweight, or sql.",
                s
            )),
        }
    }
}

impl fmt::Display for EngineChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineChoice::Auto => write!(f, "auto"),
            EngineChoice::Lightweight => write!(f, "lightweight"),
            EngineChoice::Sql => write!(f, "sql"),
        }
    }
}

/// Pick an engine according to `choice` and what the runtime offers.
pub fn select_validator(choice: EngineChoice) -> Result<Box<dyn Validator>> {
    match choice {
        EngineChoice::Lightweight => Ok(Box::new(LightweightValidator)),
        EngineChoice::Sql => sql_engine()
            .ok_or_else(|| EtlError::Config("the SQL validation engine is not available".into())),
        EngineChoice::Auto => Ok(sql_engine().unwrap_or_else(|| {
            tracing::info!("SQL validation engine unavailable, using lightweight engine");
            Box::new(LightweightValidator)
        })),
    }
}

#[cfg(feature = "sql-engine")]
fn sql_engine() -> Option<Box<dyn Validator>> {
    SqlValidator::probe().map(|v| Box::new(v) as Box<dyn Validator>)
}

#[cfg(not(feature = "sql-engine"))]
fn sql_engine() -> Option<Box<dyn Validator>> {
    None
}

/// Options for [`run_validation`].
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    pub engine: EngineChoice,
    /// Where the report artifact is written.
    pub results_dir: PathBuf,
    /// Recorded in the report when the config came from a file.
    pub config_path: Option<PathBuf>,
}

impl ValidationOptions {
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            engine: EngineChoice::Auto,
            results_dir: results_dir.into(),
            config_path: None,
        }
    }

    pub fn with_engine(mut self, engine: EngineChoice) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }
}

/// Validate the CSV at `dataset_path` against `config`.
///
/// The report is written to `options.results_dir` on every run that gets
/// past config and input checks, whether or not it passed.
pub fn run_validation(
    dataset_path: impl AsRef<Path>,
    config: &IngestionConfig,
    options: &ValidationOptions,
) -> Result<(bool, ValidationReport)> {
    let dataset_path = dataset_path.as_ref();

    config.validate()?;
    let validator = select_validator(options.engine)?;

    let (table, source) = Parser::new().parse_file(dataset_path)?;

    let findings = validator.check(&table, config)?;
    let advisories = rules::advisories(&table, config);

    let mut report = ValidationReport::new(
        source,
        validator.name(),
        config.rule_count(),
        findings,
        advisories,
    );
    if let Some(path) = &options.config_path {
        report = report.with_config_path(path);
    }

    let artifact = report.save(&options.results_dir)?;
    report.artifact = Some(artifact.clone());

    tracing::info!(
        file = %report.input.file,
        engine = validator.name(),
        passed = report.passed,
        findings = report.findings.len(),
        advisories = report.advisories.len(),
        report = %artifact.display(),
        "validation finished"
    );

    Ok((report.passed, report))
}
