//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use stageline::EngineChoice;

/// Stageline: stage, validate and transform CSV data locally
#[derive(Parser)]
#[command(name = "stageline")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project root; relative paths in settings resolve against it
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Log level used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Copy a source CSV into the staged location
    Ingest {
        /// Path to the source CSV
        #[arg(value_name = "CSV")]
        csv: PathBuf,

        /// Destination (default: the configured staged CSV)
        #[arg(long)]
        dest: Option<PathBuf>,

        /// Validate the staged copy afterwards
        #[arg(long)]
        validate: bool,
    },

    /// Validate a CSV against the ingestion config
    Validate {
        /// Path to the CSV
        #[arg(value_name = "CSV")]
        csv: PathBuf,

        /// Ingestion config (default: the configured path)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Validation engine
        #[arg(short, long)]
        engine: Option<EngineChoice>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load the staged CSV and run transform scripts in order
    Transform {
        /// Staged CSV (default: the configured path)
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Scripts directory (default: the configured path)
        #[arg(long)]
        scripts: Option<PathBuf>,

        /// Staging database (default: the configured path)
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// List transform scripts in execution order
    Scripts {
        /// Scripts directory (default: the configured path)
        #[arg(long)]
        scripts: Option<PathBuf>,
    },

    /// Copy staging tables into a target database
    Load {
        /// Target database (default: the configured path)
        #[arg(long)]
        target: Option<PathBuf>,

        /// Table to copy; repeat for several (default: all)
        #[arg(long = "table", value_name = "NAME")]
        tables: Vec<String>,
    },

    /// Run ingest, validate, transform and load
    Run {
        /// Path to the source CSV
        #[arg(value_name = "CSV")]
        csv: PathBuf,

        /// Target database; the load stage is skipped without one
        #[arg(long)]
        target: Option<PathBuf>,
    },

    /// Start the admin HTTP server
    Serve {
        /// Bind address (default: from settings)
        #[arg(long)]
        host: Option<String>,

        /// Port (default: from settings)
        #[arg(short, long)]
        port: Option<u16>,
    },
}
