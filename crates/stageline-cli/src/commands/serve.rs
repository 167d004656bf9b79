//! Serve command - run the admin HTTP server.

use std::net::SocketAddr;

use anyhow::Context;
use colored::Colorize;
use stageline::Settings;

use super::Status;
use crate::server::{app, state::AppState};

pub fn run(settings: &Settings, host: Option<String>, port: Option<u16>) -> anyhow::Result<Status> {
    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", host, port))?;

    println!(
        "{} {}",
        "Starting admin server at".cyan().bold(),
        format!("http://{}", addr).white().bold()
    );
    println!("  Staged CSV: {}", settings.staged_csv_path().display());
    println!("  Staging DB: {}", settings.staging_db_path().display());
    println!();
    println!("Press {} to stop the server", "Ctrl+C".yellow().bold());

    let state = AppState::new(settings.clone());
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(app::run_server(state, addr))?;

    Ok(Status::Success)
}
