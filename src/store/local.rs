//! Local fallback backend: one JSON document per collection.
//!
//! Each collection lives in `<root>/<collection>.json` as an array of full
//! snapshots. A mutation rewrites the whole array through a temporary sibling
//! file that is renamed over the original, so readers never see a torn file.
//! Mutations of one collection are serialised inside the process.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::Value as JsonValue;
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

use crate::error::{AppError, AppResult};

/// Durable, process-local collection store.
#[derive(Clone, Debug)]
pub struct LocalStore {
    root: PathBuf,
    locks: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl LocalStore {
    /// Open (and create if needed) the store directory.
    pub async fn open(root: impl Into<PathBuf>) -> AppResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            AppError::LocalStore(format!(
                "Failed to create data directory {}: {}",
                root.display(),
                e
            ))
        })?;

        Ok(Self {
            root,
            locks: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.root.join(format!("{}.json", collection))
    }

    fn lock_for(&self, collection: &str) -> AppResult<Arc<AsyncMutex<()>>> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| AppError::LocalStore("collection lock table poisoned".to_string()))?;
        Ok(locks
            .entry(collection.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone())
    }

    /// Read the whole collection. A missing file is an empty collection.
    pub async fn snapshot(&self, collection: &str) -> AppResult<Vec<JsonValue>> {
        let path = self.collection_path(collection);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(AppError::LocalStore(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            AppError::LocalStore(format!("Corrupt collection file {}: {}", path.display(), e))
        })
    }

    /// Read-modify-write one collection under its lock.
    ///
    /// The closure returns `Some(value)` when it changed the rows, which are
    /// then written back; `None` leaves the file untouched.
    pub async fn mutate<R, F>(&self, collection: &str, f: F) -> AppResult<Option<R>>
    where
        F: FnOnce(&mut Vec<JsonValue>) -> AppResult<Option<R>>,
    {
        let lock = self.lock_for(collection)?;
        let _guard = lock.lock().await;

        let mut rows = self.snapshot(collection).await?;
        let Some(outcome) = f(&mut rows)? else {
            return Ok(None);
        };

        self.write_collection(collection, &rows).await?;
        Ok(Some(outcome))
    }

    async fn write_collection(&self, collection: &str, rows: &[JsonValue]) -> AppResult<()> {
        let path = self.collection_path(collection);
        let temp_path = self.root.join(format!(".{}.json.tmp", collection));

        let body = serde_json::to_vec_pretty(rows)
            .map_err(|e| AppError::LocalStore(format!("Failed to encode {}: {}", collection, e)))?;

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AppError::LocalStore(format!("Failed to create directory: {}", e)))?;

        tokio::fs::write(&temp_path, body)
            .await
            .map_err(|e| AppError::LocalStore(format!("Failed to write temp file: {}", e)))?;

        tokio::fs::rename(&temp_path, &path)
            .await
            .map_err(|e| AppError::LocalStore(format!("Failed to replace {}: {}", path.display(), e)))?;

        debug!(collection, rows = rows.len(), "Local collection written");
        Ok(())
    }
}
