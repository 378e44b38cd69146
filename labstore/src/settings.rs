use crate::storage::DEFAULT_CACHE_SIZE_MB;
use crate::AppError;
use config::{Config, Environment, File};
use log::debug;
use serde::Deserialize;
use std::path::PathBuf;

fn default_cache_size_mb() -> usize {
    DEFAULT_CACHE_SIZE_MB
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct StoreSettings {
    pub db_dir: PathBuf,
    pub db_name: String,
    #[serde(default = "default_cache_size_mb")]
    pub cache_size_mb: usize,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl StoreSettings {
    pub fn new(db_dir: impl Into<PathBuf>, db_name: &str) -> Self {
        Self { db_dir: db_dir.into(), db_name: db_name.to_string(), cache_size_mb: default_cache_size_mb(), log_level: default_log_level() }
    }

    pub fn db_path(&self) -> PathBuf {
        self.db_dir.join(&self.db_name)
    }

    /// Reads `path` (any format `config` recognizes by extension) and lets `PREFIX__*`
    /// environment variables override it, e.g. `LABSTORE__CACHE_SIZE_MB=128`.
    pub fn load(path: &str, prefix: &str) -> Result<Self, AppError> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(true))
            .add_source(Environment::with_prefix(prefix).try_parsing(true).separator("__"))
            .build()?
            .try_deserialize::<StoreSettings>()?;
        debug!("{:#?}", settings);
        Ok(settings)
    }
}
