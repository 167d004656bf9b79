//! Validation of the staged CSV.

use axum::{Json, extract::State};
use serde::Serialize;
use stageline::{ValidationOptions, ValidationReport, run_validation};

use crate::server::error::ApiError;
use crate::server::state::AppState;

/// Response for the validate endpoint.
#[derive(Serialize)]
pub struct ValidateResponse {
    pub validation_ok: bool,
    pub report: ValidationReport,
}

/// Validate the staged CSV with the configured engine.
pub async fn validate_staged(
    State(state): State<AppState>,
) -> Result<Json<ValidateResponse>, ApiError> {
    let staged = state.settings.staged_csv_path();
    if !staged.exists() {
        return Err(ApiError::BadRequest(
            "no staged CSV; ingest a file first".to_string(),
        ));
    }

    let config = state.ingestion_config()?;
    let options = ValidationOptions::new(state.settings.results_dir_path())
        .with_engine(state.settings.engine)
        .with_config_path(state.settings.ingestion_config_path());

    let (validation_ok, report) =
        tokio::task::spawn_blocking(move || run_validation(&staged, &config, &options))
            .await
            .map_err(|e| ApiError::Internal(format!("validation task failed: {}", e)))??;

    Ok(Json(ValidateResponse {
        validation_ok,
        report,
    }))
}
