// Metadata store
// サーバーディレクトリごとの key=value ファイル

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::store::StoreError;

pub const METADATA_FILE: &str = ".mcsrvmeta";

pub const KEY_JAR: &str = "jar";
pub const KEY_RAM: &str = "ram";
pub const KEY_JAVA_BIN: &str = "java-bin";
pub const KEY_AUTOSTART: &str = "autostart";

pub type StoredMetadata = BTreeMap<String, String>;

#[derive(Debug, Clone)]
pub struct MetadataStore {
    path: PathBuf,
}

impl MetadataStore {
    /// Store for the metadata file inside `server_dir`.
    pub fn for_server(server_dir: &Path) -> Self {
        Self::new(server_dir.join(METADATA_FILE))
    }

    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<StoredMetadata, StoreError> {
        let content = fs::read_to_string(&self.path).map_err(|e| StoreError::io(&self.path, e))?;
        Ok(parse_metadata(&content))
    }

    /// Like [`load`](Self::load), but a missing file is an empty map.
    pub fn load_or_default(&self) -> Result<StoredMetadata, StoreError> {
        match self.load() {
            Ok(data) => Ok(data),
            Err(StoreError::NotFound(_)) => Ok(StoredMetadata::new()),
            Err(err) => Err(err),
        }
    }

    /// Overwrites the whole file. Individual line writes are best-effort;
    /// only the final sync is reported.
    pub fn save(&self, data: &StoredMetadata) -> Result<(), StoreError> {
        let mut file = fs::File::create(&self.path).map_err(|e| StoreError::io(&self.path, e))?;
        for (key, value) in data {
            if let Err(err) = writeln!(file, "{}={}", key, value) {
                tracing::debug!(key = %key, error = %err, "dropped metadata entry");
            }
        }
        file.sync_all().map_err(|e| StoreError::io(&self.path, e))
    }

    /// Load-modify-save of a single key, keeping every other entry.
    pub fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut data = self.load_or_default()?;
        data.insert(key.to_string(), value.to_string());
        self.save(&data)
    }
}

pub fn parse_metadata(content: &str) -> StoredMetadata {
    let mut out = StoredMetadata::new();
    for line in content.lines() {
        let line = line.trim();
        if line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        out.insert(key.to_string(), value.to_string());
    }
    out
}
