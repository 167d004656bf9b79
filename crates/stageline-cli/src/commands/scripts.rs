//! Scripts command - list transform scripts in execution order.

use std::path::PathBuf;

use colored::Colorize;
use stageline::{Settings, discover_scripts};

use super::Status;

pub fn run(settings: &Settings, scripts: Option<PathBuf>) -> anyhow::Result<Status> {
    let dir = scripts.unwrap_or_else(|| settings.transforms_dir_path());

    let found = discover_scripts(&dir)?;
    if found.is_empty() {
        println!("{} no .sql files in {}", "Note:".yellow(), dir.display());
        return Ok(Status::Success);
    }

    println!("{} {}", "Scripts in".cyan().bold(), dir.display());
    for (i, script) in found.iter().enumerate() {
        println!("  {:>3}. {}", i + 1, script.name);
    }

    Ok(Status::Success)
}
