//! Validation report and its persisted artifact.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::finding::Finding;
use crate::error::{EtlError, Result};
use crate::input::SourceMetadata;

/// Suffix shared by every report artifact.
const REPORT_SUFFIX: &str = "_result.json";

/// Counts summarising a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportStatistics {
    pub rows: usize,
    pub evaluated_rules: usize,
    pub failed_rules: usize,
    pub findings: usize,
    pub advisories: usize,
}

/// Outcome of one validation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// The validated input.
    pub input: SourceMetadata,
    /// Config document the rules came from, when loaded from disk.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub config_path: Option<PathBuf>,
    /// Engine that produced the findings.
    pub engine: String,
    pub validated_at: DateTime<Utc>,
    pub passed: bool,
    pub statistics: ReportStatistics,
    /// Blocking rule violations, in detection order.
    pub findings: Vec<Finding>,
    /// Type/format observations that do not affect `passed`.
    #[serde(default)]
    pub advisories: Vec<Finding>,
    /// Where the report was written; set by [`run_validation`](super::run_validation).
    #[serde(skip)]
    pub artifact: Option<PathBuf>,
}

impl ValidationReport {
    /// Assemble a report. `passed` is derived from `findings`.
    pub fn new(
        input: SourceMetadata,
        engine: impl Into<String>,
        evaluated_rules: usize,
        findings: Vec<Finding>,
        advisories: Vec<Finding>,
    ) -> Self {
        let failed_rules = {
            let mut rules: Vec<(&str, _)> = findings
                .iter()
                .map(|f| (f.column.as_str(), f.kind))
                .collect();
            rules.sort();
            rules.dedup();
            rules.len()
        };

        let statistics = ReportStatistics {
            rows: input.row_count,
            evaluated_rules,
            failed_rules,
            findings: findings.len(),
            advisories: advisories.len(),
        };

        Self {
            input,
            config_path: None,
            engine: engine.into(),
            validated_at: Utc::now(),
            passed: findings.is_empty(),
            statistics,
            findings,
            advisories,
            artifact: None,
        }
    }

    /// Record the config document path.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Deterministic artifact name: `<input stem>_<UTC timestamp>_result.json`.
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}{}",
            self.input.stem(),
            self.validated_at.format("%Y%m%dT%H%M%S%3fZ"),
            REPORT_SUFFIX
        )
    }

    /// Write the report into `results_dir`, creating it if needed.
    pub fn save(&self, results_dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = results_dir.as_ref();

        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| {
                EtlError::Persistence(format!(
                    "Failed to create directory '{}': {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        let path = dir.join(self.file_name());
        let file = File::create(&path).map_err(|e| {
            EtlError::Persistence(format!(
                "Failed to create file '{}': {}",
                path.display(),
                e
            ))
        })?;

        self.write_to(file)?;

        tracing::debug!(path = %path.display(), "wrote validation report");
        Ok(path)
    }

    /// Serialize as pretty JSON, flushing before returning.
    fn write_to(&self, inner: impl Write) -> Result<()> {
        let mut writer = BufWriter::new(inner);
        serde_json::to_writer_pretty(&mut writer, self).map_err(|e| {
            EtlError::Persistence(format!("Failed to serialize validation report: {}", e))
        })?;
        writer.flush().map_err(|e| {
            EtlError::Persistence(format!("Failed to write validation report: {}", e))
        })
    }

    /// Load a report artifact.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let file = File::open(path).map_err(|e| {
            EtlError::Persistence(format!(
                "Failed to open file '{}': {}",
                path.display(),
                e
            ))
        })?;

        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            EtlError::Persistence(format!(
                "Failed to parse validation report '{}': {}",
                path.display(),
                e
            ))
        })
    }
}

/// List report artifacts in `results_dir`, newest first.
///
/// Timestamps are embedded in the file names, so for one input stem the
/// names sort chronologically; across stems the modification time decides.
pub fn list_reports(results_dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = results_dir.as_ref();
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut entries: Vec<(std::time::SystemTime, PathBuf)> = fs::read_dir(dir)
        .map_err(|e| {
            EtlError::Persistence(format!(
                "Failed to read results directory '{}': {}",
                dir.display(),
                e
            ))
        })?
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .file_name()
                .to_string_lossy()
                .ends_with(REPORT_SUFFIX)
        })
        .map(|entry| {
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(std::time::UNIX_EPOCH);
            (modified, entry.path())
        })
        .collect();

    entries.sort_by(|a, b| b.cmp(a));
    Ok(entries.into_iter().map(|(_, path)| path).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::finding::FindingKind;

    fn metadata() -> SourceMetadata {
        SourceMetadata::new(PathBuf::from("data/staged.csv"), "sha256:00".into(), 10, 2, 2)
    }

    #[test]
    fn test_passed_follows_findings() {
        let clean = ValidationReport::new(metadata(), "lightweight", 4, vec![], vec![]);
        assert!(clean.passed);

        let failing = ValidationReport::new(
            metadata(),
            "lightweight",
            4,
            vec![
                Finding::null_in_required("id", 0, Default::default()),
                Finding::null_in_required("id", 1, Default::default()),
            ],
            vec![],
        );
        assert!(!failing.passed);
        assert_eq!(failing.statistics.findings, 2);
        assert_eq!(failing.statistics.failed_rules, 1);
    }

    #[test]
    fn test_file_name_is_deterministic() {
        let report = ValidationReport::new(metadata(), "lightweight", 0, vec![], vec![]);
        let name = report.file_name();
        assert!(name.starts_with("staged_"));
        assert!(name.ends_with("_result.json"));
        assert_eq!(name, report.file_name());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let results = dir.path().join("validation_results");
        let report = ValidationReport::new(
            metadata(),
            "lightweight",
            3,
            vec![Finding::missing_column("email")],
            vec![],
        )
        .with_config_path("configs/ingestion_config.yml");

        let path = report.save(&results).unwrap();
        assert!(path.exists());

        let loaded = ValidationReport::load(&path).unwrap();
        assert!(!loaded.passed);
        assert_eq!(loaded.findings[0].kind, FindingKind::MissingColumn);
        assert_eq!(loaded.input, report.input);

        assert_eq!(list_reports(&results).unwrap(), vec![path]);
    }

    /// Accepts nothing, like a full disk.
    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("no space left on device"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_is_reported() {
        let report = ValidationReport::new(metadata(), "lightweight", 0, vec![], vec![]);
        let err = report.write_to(FullDisk).unwrap_err();
        assert!(matches!(err, EtlError::Persistence(_)));
    }

    #[test]
    fn test_list_reports_missing_dir() {
        assert!(list_reports("/nonexistent/results").unwrap().is_empty());
    }
}
