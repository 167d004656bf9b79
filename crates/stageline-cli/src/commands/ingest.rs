//! Ingest command - stage a source CSV.

use std::path::PathBuf;

use colored::Colorize;
use stageline::{Settings, copy_to_dest};

use super::{Status, validate};

pub fn run(
    settings: &Settings,
    csv: PathBuf,
    dest: Option<PathBuf>,
    then_validate: bool,
) -> anyhow::Result<Status> {
    let dest = dest.unwrap_or_else(|| settings.staged_csv_path());

    let staged = copy_to_dest(&csv, &dest)?;
    println!(
        "{} {} -> {}",
        "Staged".green().bold(),
        csv.display(),
        staged.display().to_string().white()
    );

    if !then_validate {
        return Ok(Status::Success);
    }

    println!();
    let report = validate::validate_file(
        settings,
        &staged,
        &settings.ingestion_config_path(),
        settings.engine,
    )?;
    validate::print_report(&report);

    Ok(if report.passed {
        Status::Success
    } else {
        Status::ValidationFailed
    })
}
