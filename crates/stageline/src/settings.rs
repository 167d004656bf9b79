//! Process-level settings.
//!
//! Uses `figment` for layered settings: defaults -> `<root>/stageline.toml` ->
//! `STAGELINE_` environment variables. The resulting [`Settings`] value is
//! built once at process start and handed to every component that needs it.

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::validation::EngineChoice;

/// Settings file looked up in the project root.
pub const SETTINGS_FILE: &str = "stageline.toml";

/// Admin server bind settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Paths and knobs shared by the pipeline stages.
///
/// Relative paths are resolved against [`Settings::root`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Project root; not read from any provider.
    #[serde(skip)]
    pub root: PathBuf,
    /// Where `ingest` copies the source CSV.
    pub staged_csv: PathBuf,
    /// Staging SQLite database.
    pub staging_db: PathBuf,
    /// Directory of `.sql` transform scripts.
    pub transforms_dir: PathBuf,
    /// Directory receiving validation report artifacts.
    pub results_dir: PathBuf,
    /// Ingestion config document.
    pub ingestion_config: PathBuf,
    /// Optional target database for the load stage.
    pub target_db: Option<PathBuf>,
    /// Table the staged CSV is loaded into before transforms run.
    pub raw_table: String,
    /// Validation engine selection.
    pub engine: EngineChoice,
    pub server: ServerSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            staged_csv: PathBuf::from("data/staged.csv"),
            staging_db: PathBuf::from("data/staging.db"),
            transforms_dir: PathBuf::from("sql/transforms"),
            results_dir: PathBuf::from("validation_results"),
            ingestion_config: PathBuf::from("configs/ingestion_config.yml"),
            target_db: None,
            raw_table: "transactions".to_string(),
            engine: EngineChoice::Auto,
            server: ServerSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings for a project rooted at `root`.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (`STAGELINE_RESULTS_DIR`, `STAGELINE_SERVER__PORT`, ...)
    /// 2. `<root>/stageline.toml`
    /// 3. Built-in defaults
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));

        let file = root.join(SETTINGS_FILE);
        if file.exists() {
            figment = figment.merge(Toml::file(&file));
        }

        figment = figment.merge(Env::prefixed("STAGELINE_").split("__"));

        let mut settings: Settings = figment.extract().map_err(Box::new)?;
        settings.root = root.to_path_buf();
        Ok(settings)
    }

    /// Defaults rooted at `root`, without consulting any provider.
    pub fn rooted(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Resolve a possibly relative path against the root.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn staged_csv_path(&self) -> PathBuf {
        self.resolve(&self.staged_csv)
    }

    pub fn staging_db_path(&self) -> PathBuf {
        self.resolve(&self.staging_db)
    }

    pub fn transforms_dir_path(&self) -> PathBuf {
        self.resolve(&self.transforms_dir)
    }

    pub fn results_dir_path(&self) -> PathBuf {
        self.resolve(&self.results_dir)
    }

    pub fn ingestion_config_path(&self) -> PathBuf {
        self.resolve(&self.ingestion_config)
    }

    pub fn target_db_path(&self) -> Option<PathBuf> {
        self.target_db.as_ref().map(|p| self.resolve(p))
    }
}
