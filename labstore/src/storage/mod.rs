pub(crate) mod catalog;
pub(crate) mod context;
pub(crate) mod table_rows;
pub(crate) mod table_unique;

use crate::codec::{BincodeCodec, Codec};
use crate::settings::StoreSettings;
use crate::AppError;
use log::info;
use redb::Database;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{env, fs};

pub const DEFAULT_CACHE_SIZE_MB: usize = 64;

/// Handle to one store file. Clones share the underlying database.
#[derive(Clone)]
pub struct Storage {
    pub(crate) db: Arc<Database>,
    codec: Arc<dyn Codec>,
    path: PathBuf,
}

impl Storage {
    /// Opens `dir/name`, creating the directory and the file when missing.
    pub fn open(dir: impl AsRef<Path>, name: &str) -> Result<Storage, AppError> {
        Self::open_path(dir.as_ref().join(name), DEFAULT_CACHE_SIZE_MB)
    }

    pub fn from_settings(settings: &StoreSettings) -> Result<Storage, AppError> {
        Self::open_path(settings.db_path(), settings.cache_size_mb)
    }

    pub fn open_path(path: PathBuf, cache_size_mb: usize) -> Result<Storage, AppError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let existed = path.exists();
        let db = Database::builder().set_cache_size(cache_size_mb * 1024 * 1024).create(&path)?;
        let storage = Storage { db: Arc::new(db), codec: Arc::new(BincodeCodec), path };
        storage.write(catalog::init)?;
        if existed {
            info!("Opened existing store at {:?}", storage.path);
        } else {
            info!("Created store at {:?}", storage.path);
        }
        Ok(storage)
    }

    /// Fresh store in the system temp dir, named uniquely.
    pub fn temp(name: &str) -> Result<Storage, AppError> {
        let dir = env::temp_dir().join("labstore");
        Self::open(dir, &format!("{}_{}.redb", name, rand::random::<u64>()))
    }

    /// Replaces the payload codec. Data written with another codec will fail to decode.
    pub fn with_codec(mut self, codec: impl Codec + 'static) -> Storage {
        self.codec = Arc::new(codec);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn codec(&self) -> &dyn Codec {
        self.codec.as_ref()
    }
}
