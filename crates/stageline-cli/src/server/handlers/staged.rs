//! Staged CSV download.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use stageline::EtlError;

use crate::server::error::ApiError;
use crate::server::state::AppState;

/// Return the staged CSV, or 404 `{"exists": false}` when nothing is staged.
pub async fn get_staged(State(state): State<AppState>) -> Result<Response, ApiError> {
    let path = state.settings.staged_csv_path();

    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(([(header::CONTENT_TYPE, "text/csv")], bytes).into_response()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Ok((StatusCode::NOT_FOUND, Json(json!({ "exists": false }))).into_response())
        }
        Err(e) => Err(EtlError::io(path, e).into()),
    }
}
