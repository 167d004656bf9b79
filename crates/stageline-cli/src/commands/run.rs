//! Run command - full ingest, validate, transform, load pipeline.

use std::path::PathBuf;

use colored::Colorize;
use stageline::{IngestionConfig, Pipeline, Settings, StageStatus};

use super::Status;

pub fn run(settings: &Settings, csv: PathBuf, target: Option<PathBuf>) -> anyhow::Result<Status> {
    let mut settings = settings.clone();
    if let Some(target) = target {
        settings.target_db = Some(std::path::absolute(&target)?);
    }

    let config = IngestionConfig::load(settings.ingestion_config_path())?;

    println!(
        "{} {}",
        "Running pipeline for".cyan().bold(),
        csv.display().to_string().white()
    );
    println!();

    let report = Pipeline::new(settings, config).run(&csv);

    for outcome in &report.outcomes {
        let marker = match outcome.status {
            StageStatus::Succeeded => "✓".green(),
            StageStatus::Failed => "✗".red(),
            StageStatus::Skipped => "-".dimmed(),
        };
        println!("  {} {:10} {}", marker, outcome.stage.to_string(), outcome.detail);
    }
    println!();

    match report.failed_stage() {
        None => {
            println!("{}", "Pipeline succeeded".green().bold());
            Ok(Status::Success)
        }
        Some(failed) => {
            println!(
                "{} at the {} stage",
                "Pipeline failed".red().bold(),
                failed.stage
            );
            Ok(match failed.error_kind {
                Some(kind) => Status::StageFailed(kind),
                None => Status::ValidationFailed,
            })
        }
    }
}
