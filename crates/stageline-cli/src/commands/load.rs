//! Load command - copy staging tables into a target database.

use std::path::PathBuf;

use colored::Colorize;
use stageline::{EtlError, Settings, load_to_target};

use super::Status;

pub fn run(
    settings: &Settings,
    target: Option<PathBuf>,
    tables: Vec<String>,
) -> anyhow::Result<Status> {
    let target = target
        .or_else(|| settings.target_db_path())
        .ok_or_else(|| {
            EtlError::Config(
                "no target database: pass --target or set target_db in stageline.toml".into(),
            )
        })?;

    let summary = load_to_target(settings.staging_db_path(), &target, &tables)?;

    for table in &summary.tables {
        println!("  {} {:24} {} rows", "✓".green(), table.name, table.rows);
    }
    println!(
        "{} {} table(s) into {}",
        "Loaded".green().bold(),
        summary.tables.len(),
        summary.target.display().to_string().white()
    );

    Ok(Status::Success)
}
