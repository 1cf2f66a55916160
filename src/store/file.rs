use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{SessionStore, StoreError, StoreKey};

/// One `<key>.json` file per key inside a directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub async fn open(dir: &Path) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(dir).await?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn path_for(&self, key: StoreKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }
}

#[async_trait]
impl SessionStore for FileStore {
    async fn load(&self, key: StoreKey) -> Result<Option<Value>, StoreError> {
        let raw = match tokio::fs::read(self.path_for(key)).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { key, source }),
        };
        let value = serde_json::from_slice(&raw).map_err(|source| StoreError::Malformed { key, source })?;
        Ok(Some(value))
    }

    /// Writes a sibling temp file and renames it over the target.
    async fn save(&self, key: StoreKey, value: &Value) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_vec(value).map_err(|source| StoreError::Malformed { key, source })?;
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|source| StoreError::Io { key, source })?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|source| StoreError::Io { key, source })?;
        debug!(%key, path = %path.display(), "document written");
        Ok(())
    }

    async fn clear(&self, key: StoreKey) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { key, source }),
        }
    }
}
