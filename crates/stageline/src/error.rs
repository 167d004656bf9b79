//! Error types for the stageline library.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for stageline operations.
#[derive(Debug, Error)]
pub enum EtlError {
    /// Ingestion config or settings are missing required keys or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The dataset cannot be read or does not structurally parse.
    #[error("Input error for '{path}': {message}")]
    Input { path: PathBuf, message: String },

    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A transform script failed; later scripts were not run.
    #[error("Transform '{script}' failed: {source}")]
    Transform {
        script: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Error from the staging or target database.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Failed to write or read a report artifact.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parse error in the ingestion config.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Layered settings could not be extracted.
    #[error("Settings error: {0}")]
    Settings(#[from] Box<figment::Error>),
}

/// Coarse classification used by callers to pick exit codes and status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Config,
    Input,
    Transform,
    Other,
}

impl EtlError {
    /// Build an input error for a path.
    pub fn input(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        EtlError::Input {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Build an IO error for a path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EtlError::Io {
            path: path.into(),
            source,
        }
    }

    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EtlError::Config(_) | EtlError::Yaml(_) | EtlError::Settings(_) => ErrorKind::Config,
            EtlError::Input { .. } | EtlError::Csv(_) => ErrorKind::Input,
            EtlError::Transform { .. } => ErrorKind::Transform,
            EtlError::Io { .. }
            | EtlError::Database(_)
            | EtlError::Persistence(_)
            | EtlError::Json(_) => ErrorKind::Other,
        }
    }
}

/// Result type alias for stageline operations.
pub type Result<T> = std::result::Result<T, EtlError>;
