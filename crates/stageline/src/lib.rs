//! Stageline: a local CSV staging, validation and SQL transform toolkit.
//!
//! A source CSV is copied to a staged location, checked against a declarative
//! ingestion config, loaded into a file-backed `SQLite` staging store and
//! reshaped by an ordered directory of SQL scripts.
//!
//! # Core Principles
//!
//! - **Declarative checks**: required columns, non-null and unique-key rules
//!   come from a YAML document, not code
//! - **Two engines, one answer**: the SQL expectation engine and the
//!   lightweight engine report the same blocking findings
//! - **Auditable**: every validation run leaves a JSON report artifact
//!
//! # Example
//!
//! ```no_run
//! use stageline::{IngestionConfig, ValidationOptions, run_transforms, run_validation};
//!
//! let config = IngestionConfig::load("configs/ingestion_config.yml").unwrap();
//! let options = ValidationOptions::new("validation_results");
//! let (passed, report) = run_validation("data/staged.csv", &config, &options).unwrap();
//!
//! println!("Passed: {} ({} findings)", passed, report.findings.len());
//! if passed {
//!     run_transforms("data/staged.csv", "data/staging.db", "sql/transforms").unwrap();
//! }
//! ```

pub mod config;
pub mod error;
pub mod ingest;
pub mod input;
pub mod load;
pub mod pipeline;
pub mod settings;
pub mod staging;
pub mod transform;
pub mod validation;

pub use config::{ColumnSpec, ColumnType, FormatRule, IngestionConfig};
pub use error::{ErrorKind, EtlError, Result};
pub use ingest::copy_to_dest;
pub use input::{DataTable, Parser, SourceMetadata};
pub use load::{LoadSummary, LoadedTable, load_to_target};
pub use pipeline::{
    NoopHooks, Pipeline, PipelineHooks, PipelineReport, Stage, StageOutcome, StageStatus,
};
pub use settings::{ServerSettings, Settings};
pub use staging::StagingStore;
pub use transform::{TransformRunner, TransformScript, TransformSummary, discover_scripts, run_transforms};
pub use validation::{
    EngineChoice, Finding, FindingKind, ValidationOptions, ValidationReport, Validator,
    list_reports, run_validation, select_validator,
};
