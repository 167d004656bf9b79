//! Validate command - check a CSV against the ingestion config.

use std::path::{Path, PathBuf};

use colored::Colorize;
use stageline::{
    EngineChoice, FindingKind, IngestionConfig, Settings, ValidationOptions, ValidationReport,
    run_validation,
};

use super::Status;

/// Findings printed before the list is truncated.
const MAX_PRINTED: usize = 20;

pub fn run(
    settings: &Settings,
    csv: PathBuf,
    config: Option<PathBuf>,
    engine: Option<EngineChoice>,
    json_output: bool,
) -> anyhow::Result<Status> {
    let config_path = config.unwrap_or_else(|| settings.ingestion_config_path());
    let engine = engine.unwrap_or(settings.engine);

    if !json_output {
        println!(
            "{} {}",
            "Validating".cyan().bold(),
            csv.display().to_string().white()
        );
    }

    let report = validate_file(settings, &csv, &config_path, engine)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(if report.passed {
        Status::Success
    } else {
        Status::ValidationFailed
    })
}

/// Load the config at `config_path` and validate `csv`, writing the report
/// into the configured results directory.
pub fn validate_file(
    settings: &Settings,
    csv: &Path,
    config_path: &Path,
    engine: EngineChoice,
) -> anyhow::Result<ValidationReport> {
    let config = IngestionConfig::load(config_path)?;
    let options = ValidationOptions::new(settings.results_dir_path())
        .with_engine(engine)
        .with_config_path(config_path);
    let (_, report) = run_validation(csv, &config, &options)?;
    Ok(report)
}

/// Human-readable summary of a report.
pub fn print_report(report: &ValidationReport) {
    println!(
        "Checked {} rows against {} rules with the {} engine",
        report.statistics.rows.to_string().white().bold(),
        report.statistics.evaluated_rules,
        report.engine.cyan()
    );

    if !report.findings.is_empty() {
        println!();
        println!("{}", "Findings:".red().bold());
        for finding in report.findings.iter().take(MAX_PRINTED) {
            let kind = match finding.kind {
                FindingKind::MissingColumn => finding.kind.label().red(),
                _ => finding.kind.label().yellow(),
            };
            println!("  {:18} {:16} {}", kind, finding.column, finding.detail);
        }
        if report.findings.len() > MAX_PRINTED {
            println!("  ... and {} more", report.findings.len() - MAX_PRINTED);
        }
    }

    if !report.advisories.is_empty() {
        println!();
        println!("{}", "Advisories:".yellow().bold());
        for advisory in &report.advisories {
            println!(
                "  {:18} {:16} {}",
                advisory.kind.label().blue(),
                advisory.column,
                advisory.detail
            );
        }
    }

    println!();
    if let Some(path) = &report.artifact {
        println!("Report: {}", path.display());
    }
    if report.passed {
        println!("{} {}", "✓".green(), "Validation passed".green().bold());
    } else {
        println!(
            "{} {} ({} findings)",
            "✗".red(),
            "Validation failed".red().bold(),
            report.findings.len()
        );
    }
}
