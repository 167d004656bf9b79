//! Stageline CLI - local CSV staging, validation and transforms.

mod cli;
mod commands;
mod logging;
mod server;

use clap::Parser;
use cli::{Cli, Commands};
use commands::Status;
use stageline::{EtlError, Settings};

fn main() {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    let result = Settings::load(&cli.root)
        .map_err(anyhow::Error::from)
        .and_then(|settings| dispatch(cli.command, &settings));

    match result {
        Ok(status) => std::process::exit(status.exit_code()),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            let code = e
                .downcast_ref::<EtlError>()
                .map(|err| commands::error_exit_code(err.kind()))
                .unwrap_or(1);
            std::process::exit(code);
        }
    }
}

fn dispatch(command: Commands, settings: &Settings) -> anyhow::Result<Status> {
    match command {
        Commands::Ingest {
            csv,
            dest,
            validate,
        } => commands::ingest::run(settings, csv, dest, validate),

        Commands::Validate {
            csv,
            config,
            engine,
            json,
        } => commands::validate::run(settings, csv, config, engine, json),

        Commands::Transform { csv, scripts, db } => {
            commands::transform::run(settings, csv, scripts, db)
        }

        Commands::Scripts { scripts } => commands::scripts::run(settings, scripts),

        Commands::Load { target, tables } => commands::load::run(settings, target, tables),

        Commands::Run { csv, target } => commands::run::run(settings, csv, target),

        Commands::Serve { host, port } => commands::serve::run(settings, host, port),
    }
}
