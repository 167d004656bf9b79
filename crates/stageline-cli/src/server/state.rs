//! Application state for the admin server.

use std::sync::Arc;

use stageline::{IngestionConfig, Settings};

use super::error::ApiError;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Project settings, fixed for the server's lifetime.
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Arc::new(settings),
        }
    }

    /// Read the ingestion config fresh so edits apply without a restart.
    pub fn ingestion_config(&self) -> Result<IngestionConfig, ApiError> {
        Ok(IngestionConfig::load(self.settings.ingestion_config_path())?)
    }
}
