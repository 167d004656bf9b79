//! Transform command - load the staged CSV and run scripts.

use std::path::PathBuf;

use colored::Colorize;
use stageline::{Settings, TransformRunner};

use super::Status;

pub fn run(
    settings: &Settings,
    csv: Option<PathBuf>,
    scripts: Option<PathBuf>,
    db: Option<PathBuf>,
) -> anyhow::Result<Status> {
    let csv = csv.unwrap_or_else(|| settings.staged_csv_path());
    let scripts = scripts.unwrap_or_else(|| settings.transforms_dir_path());
    let db = db.unwrap_or_else(|| settings.staging_db_path());

    println!(
        "{} {}",
        "Transforming".cyan().bold(),
        csv.display().to_string().white()
    );

    let summary = TransformRunner::new(&db, &scripts)
        .with_raw_table(settings.raw_table.clone())
        .run(&csv)?;

    println!(
        "Loaded {} rows into {}",
        summary.rows_loaded.to_string().white().bold(),
        summary.raw_table.cyan()
    );
    for script in &summary.scripts {
        println!("  {} {}", "✓".green(), script);
    }
    println!(
        "{} {} script(s) against {}",
        "Ran".green().bold(),
        summary.scripts.len(),
        db.display()
    );

    Ok(Status::Success)
}
