//! Staging table listing.

use axum::{Json, extract::State};
use serde::Serialize;
use stageline::{StagingStore, Result as EtlResult};

use crate::server::error::ApiError;
use crate::server::state::AppState;

#[derive(Serialize)]
pub struct TableInfo {
    pub name: String,
    pub rows: usize,
}

#[derive(Serialize)]
pub struct TablesResponse {
    pub tables: Vec<TableInfo>,
}

/// Tables in the staging store with row counts. Empty when no store exists.
pub async fn list_tables(
    State(state): State<AppState>,
) -> Result<Json<TablesResponse>, ApiError> {
    let db = state.settings.staging_db_path();
    if !db.exists() {
        return Ok(Json(TablesResponse { tables: Vec::new() }));
    }

    let tables = tokio::task::spawn_blocking(move || -> EtlResult<Vec<TableInfo>> {
        let store = StagingStore::open(&db)?;
        store
            .table_names()?
            .into_iter()
            .map(|name| {
                let rows = store.row_count(&name)?;
                Ok(TableInfo { name, rows })
            })
            .collect()
    })
    .await
    .map_err(|e| ApiError::Internal(format!("table listing failed: {}", e)))??;

    Ok(Json(TablesResponse { tables }))
}
