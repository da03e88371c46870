//! File-backed key-value store.
//!
//! All keys live in one JSON object document. Every mutation rewrites the
//! document through a temporary file followed by an atomic rename, so a
//! crash mid-write leaves the previous generation intact. A SHA-256
//! sidecar (`<file>.sha256`) is written best-effort and verified on open;
//! a mismatch or an unparseable document starts the store empty rather
//! than failing the caller.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{KeyValueStore, StorageResult};

/// Durable store persisting to a single JSON document.
pub struct FileStore {
    path: PathBuf,
    data: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Open (or create) a store at `path`, loading any existing document.
    pub async fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let data = Self::load_document(&path).await;
        Ok(Self { path, data: Mutex::new(data) })
    }

    async fn load_document(path: &Path) -> HashMap<String, String> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "store document does not exist yet");
                return HashMap::new();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read store document");
                return HashMap::new();
            }
        };

        // Verify the sidecar checksum when one exists
        let checksum_path = path.with_extension("sha256");
        if let Ok(expected) = fs::read_to_string(&checksum_path).await {
            let actual = checksum(&bytes);
            if actual != expected.trim() {
                warn!(path = %path.display(), "checksum mismatch, document may be corrupted");
            }
        }

        match serde_json::from_slice::<HashMap<String, String>>(&bytes) {
            Ok(map) => map,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt store document, starting empty");
                HashMap::new()
            }
        }
    }

    /// Rewrite the document from the given snapshot.
    async fn save(&self, snapshot: &HashMap<String, String>) -> StorageResult<()> {
        let bytes = serde_json::to_vec(snapshot)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write to a temporary file first for atomicity
        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &self.path).await?;

        let checksum_path = self.path.with_extension("sha256");
        fs::write(&checksum_path, checksum(&bytes)).await.ok();

        debug!(path = %self.path.display(), bytes = bytes.len(), "store document persisted");
        Ok(())
    }

    /// Path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.data.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut data = self.data.lock().await;
        data.insert(key.to_string(), value.to_string());
        let snapshot = data.clone();
        drop(data);
        self.save(&snapshot).await
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        let mut data = self.data.lock().await;
        if data.remove(key).is_none() {
            return Ok(());
        }
        let snapshot = data.clone();
        drop(data);
        self.save(&snapshot).await
    }

    async fn keys_with_prefix(&self, prefix: &str) -> StorageResult<Vec<String>> {
        Ok(self.data.lock().await.keys().filter(|k| k.starts_with(prefix)).cloned().collect())
    }

    async fn clear(&self) -> StorageResult<()> {
        let mut data = self.data.lock().await;
        data.clear();
        let snapshot = data.clone();
        drop(data);
        self.save(&snapshot).await
    }
}
