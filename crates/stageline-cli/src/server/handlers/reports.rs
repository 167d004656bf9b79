//! Report artifact listing.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::server::error::ApiError;
use crate::server::state::AppState;

#[derive(Serialize)]
pub struct ReportsResponse {
    /// Artifact file names, newest first.
    pub reports: Vec<String>,
}

pub async fn list_reports(
    State(state): State<AppState>,
) -> Result<Json<ReportsResponse>, ApiError> {
    let reports = stageline::list_reports(state.settings.results_dir_path())?
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect();

    Ok(Json(ReportsResponse { reports }))
}
