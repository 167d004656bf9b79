//! Stage sequencing: ingest, validate, transform, load.
//!
//! A [`Pipeline`] stops at the first failed stage and marks the rest as
//! skipped. Scheduler integrations attach through [`PipelineHooks`].

use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::config::IngestionConfig;
use crate::error::{ErrorKind, EtlError, Result};
use crate::ingest::copy_to_dest;
use crate::load::{LoadSummary, load_to_target};
use crate::settings::Settings;
use crate::transform::{TransformRunner, TransformSummary};
use crate::validation::{ValidationOptions, ValidationReport, run_validation};

/// A pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Ingest,
    Validate,
    Transform,
    Load,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Ingest, Stage::Validate, Stage::Transform, Stage::Load];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Ingest => write!(f, "ingest"),
            Stage::Validate => write!(f, "validate"),
            Stage::Transform => write!(f, "transform"),
            Stage::Load => write!(f, "load"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Succeeded,
    Failed,
    Skipped,
}

/// What happened to one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageOutcome {
    pub stage: Stage,
    pub status: StageStatus,
    pub detail: String,
    /// Error class when the stage failed with an error rather than a
    /// validation failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl StageOutcome {
    fn succeeded(stage: Stage, detail: impl Into<String>) -> Self {
        Self {
            stage,
            status: StageStatus::Succeeded,
            detail: detail.into(),
            error_kind: None,
        }
    }

    fn failed(stage: Stage, detail: impl Into<String>, error_kind: Option<ErrorKind>) -> Self {
        Self {
            stage,
            status: StageStatus::Failed,
            detail: detail.into(),
            error_kind,
        }
    }

    fn skipped(stage: Stage, detail: impl Into<String>) -> Self {
        Self {
            stage,
            status: StageStatus::Skipped,
            detail: detail.into(),
            error_kind: None,
        }
    }

    fn from_error(stage: Stage, err: &EtlError) -> Self {
        Self::failed(stage, err.to_string(), Some(err.kind()))
    }
}

/// Notified after each stage settles.
pub trait PipelineHooks {
    fn on_stage(&self, outcome: &StageOutcome);
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl PipelineHooks for NoopHooks {
    fn on_stage(&self, _outcome: &StageOutcome) {}
}

/// Everything a pipeline run produced.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub outcomes: Vec<StageOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<TransformSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load: Option<LoadSummary>,
}

impl PipelineReport {
    /// True when no stage failed.
    pub fn succeeded(&self) -> bool {
        self.failed_stage().is_none()
    }

    pub fn failed_stage(&self) -> Option<&StageOutcome> {
        self.outcomes
            .iter()
            .find(|o| o.status == StageStatus::Failed)
    }
}

/// Runs the stages against one project's settings and ingestion config.
pub struct Pipeline<H: PipelineHooks = NoopHooks> {
    settings: Settings,
    config: IngestionConfig,
    hooks: H,
}

impl Pipeline<NoopHooks> {
    pub fn new(settings: Settings, config: IngestionConfig) -> Self {
        Self {
            settings,
            config,
            hooks: NoopHooks,
        }
    }
}

impl<H: PipelineHooks> Pipeline<H> {
    pub fn with_hooks<T: PipelineHooks>(self, hooks: T) -> Pipeline<T> {
        Pipeline {
            settings: self.settings,
            config: self.config,
            hooks,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run every stage for `src`. Stage failures are reported in the
    /// returned outcomes, not as errors.
    pub fn run(&self, src: impl AsRef<Path>) -> PipelineReport {
        let mut report = PipelineReport {
            outcomes: Vec::with_capacity(Stage::ALL.len()),
            validation: None,
            transform: None,
            load: None,
        };

        for stage in Stage::ALL {
            if !report.succeeded() {
                self.record(
                    &mut report,
                    StageOutcome::skipped(stage, "an earlier stage failed"),
                );
                continue;
            }
            let outcome = self.run_stage(stage, src.as_ref(), &mut report);
            self.record(&mut report, outcome);
        }

        report
    }

    fn record(&self, report: &mut PipelineReport, outcome: StageOutcome) {
        match outcome.status {
            StageStatus::Failed => {
                tracing::warn!(stage = %outcome.stage, detail = %outcome.detail, "stage failed")
            }
            _ => tracing::info!(
                stage = %outcome.stage,
                status = ?outcome.status,
                detail = %outcome.detail,
                "stage finished"
            ),
        }
        self.hooks.on_stage(&outcome);
        report.outcomes.push(outcome);
    }

    fn run_stage(&self, stage: Stage, src: &Path, report: &mut PipelineReport) -> StageOutcome {
        let staged = self.settings.staged_csv_path();

        match stage {
            Stage::Ingest => match copy_to_dest(src, &staged) {
                Ok(dest) => StageOutcome::succeeded(stage, format!("staged at {}", dest.display())),
                Err(e) => StageOutcome::from_error(stage, &e),
            },
            Stage::Validate => {
                let options = ValidationOptions::new(self.settings.results_dir_path())
                    .with_engine(self.settings.engine)
                    .with_config_path(self.settings.ingestion_config_path());
                match run_validation(&staged, &self.config, &options) {
                    Ok((passed, validation)) => {
                        let detail = format!(
                            "{} finding(s), {} advisory(ies)",
                            validation.findings.len(),
                            validation.advisories.len()
                        );
                        report.validation = Some(validation);
                        if passed {
                            StageOutcome::succeeded(stage, detail)
                        } else {
                            StageOutcome::failed(stage, format!("validation failed: {}", detail), None)
                        }
                    }
                    Err(e) => StageOutcome::from_error(stage, &e),
                }
            }
            Stage::Transform => match TransformRunner::from_settings(&self.settings).run(&staged) {
                Ok(summary) => {
                    let detail = format!(
                        "{} row(s) loaded, {} script(s) run",
                        summary.rows_loaded,
                        summary.scripts.len()
                    );
                    report.transform = Some(summary);
                    StageOutcome::succeeded(stage, detail)
                }
                Err(e) => StageOutcome::from_error(stage, &e),
            },
            Stage::Load => match self.settings.target_db_path() {
                None => StageOutcome::skipped(stage, "no target database configured"),
                Some(target) => self.load(stage, &target, report),
            },
        }
    }

    fn load(&self, stage: Stage, target: &Path, report: &mut PipelineReport) -> StageOutcome {
        let result: Result<LoadSummary> =
            load_to_target(self.settings.staging_db_path(), target, &[]);
        match result {
            Ok(summary) => {
                let detail = format!(
                    "{} table(s) loaded into {}",
                    summary.tables.len(),
                    target.display()
                );
                report.load = Some(summary);
                StageOutcome::succeeded(stage, detail)
            }
            Err(e) => StageOutcome::from_error(stage, &e),
        }
    }
}
