//! File-backed snapshot store — one JSON file per user under a directory.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::PersistenceError;

use super::{Snapshot, SnapshotStore};

/// Stores snapshots as `<dir>/<user>.json`.
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, user_id: &str) -> PathBuf {
        // User ids come from the auth layer; sanitize anyway so a hostile id
        // cannot escape the snapshot directory.
        let safe: String = user_id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn save(&self, user_id: &str, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let json = serde_json::to_vec_pretty(snapshot)?;
        tokio::fs::write(self.path_for(user_id), json).await?;
        Ok(())
    }

    async fn load(&self, user_id: &str) -> Result<Option<Snapshot>, PersistenceError> {
        let path = self.path_for(user_id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn clear(&self, user_id: &str) -> Result<(), PersistenceError> {
        match tokio::fs::remove_file(self.path_for(user_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
