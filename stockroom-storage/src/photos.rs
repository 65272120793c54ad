//! Photo attachment storage over the cache directory.
//!
//! Every write goes to a freshly named file, so a concurrent reader of the
//! old file never sees a half-written replacement; the caller swaps the
//! record's reference and only then releases the superseded file. Same-id
//! mutations serialize on the per-id lock handed out by [`PhotoStore::lock`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::{Result, StorageError};

/// Photo attachment store.
#[derive(Clone)]
pub struct PhotoStore {
    root: PathBuf,
    locks: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl PhotoStore {
    /// Open the store, creating the cache directory if needed.
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        fs::create_dir_all(&root).await.map_err(|e| {
            StorageError::Storage(format!(
                "Failed to create cache directory {:?}: {}",
                root, e
            ))
        })?;

        info!(path = ?root, "Initialized photo store");

        Ok(Self {
            root,
            locks: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// The cache directory this store writes under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// A fresh file name embedding the item id; unique per call.
    fn fresh_path(&self, id: &str, extension: Option<&str>) -> PathBuf {
        let unique = uuid::Uuid::new_v4();
        let name = match extension {
            Some(ext) => format!("{id}-{unique}.{ext}"),
            None => format!("{id}-{unique}"),
        };
        self.root.join(name)
    }

    /// Take ownership of a file already on disk (a spooled upload) for the
    /// given item, moving it into the cache directory.
    pub async fn adopt(&self, id: &str, source: &Path) -> Result<PathBuf> {
        let extension = source.extension().and_then(|e| e.to_str());
        let dest = self.fresh_path(id, extension);

        if fs::rename(source, &dest).await.is_err() {
            // Rename fails across filesystems; fall back to copy + remove.
            fs::copy(source, &dest).await?;
            if let Err(e) = fs::remove_file(source).await {
                warn!(path = ?source, error = %e, "Failed to remove adopted source file");
            }
        }

        debug!(id = %id, path = ?dest, "Adopted photo");
        Ok(dest)
    }

    /// Write raw bytes to a freshly named file for the given item.
    pub async fn store(&self, id: &str, data: Bytes) -> Result<PathBuf> {
        let dest = self.fresh_path(id, None);
        fs::write(&dest, &data).await?;
        debug!(id = %id, path = ?dest, size = data.len(), "Stored photo");
        Ok(dest)
    }

    /// Read a photo back; `NotFound` when the file is missing on disk.
    pub async fn read(&self, path: &Path) -> Result<Bytes> {
        match fs::read(path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Best-effort deletion of a photo file. Failure is logged and swallowed:
    /// the caller's record mutation must stand either way, since an orphan
    /// file is acceptable but a dangling reference is not.
    pub async fn release(&self, path: &Path) {
        match fs::remove_file(path).await {
            Ok(()) => debug!(path = ?path, "Released photo file"),
            Err(e) => warn!(path = ?path, error = %e, "Failed to release photo file"),
        }
    }

    /// Per-item mutation lock. Handlers hold it across a photo replace or
    /// delete so same-id mutations serialize; distinct ids stay independent.
    pub fn lock(&self, id: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.locks.lock().entry(id.to_string()).or_default().clone()
    }

    /// Drop the lock entry for an item that no longer exists.
    pub fn forget(&self, id: &str) {
        self.locks.lock().remove(id);
    }

    /// Number of per-id lock entries currently held. Callers forget entries
    /// for ids that turn out not to exist, so this tracks live items rather
    /// than request traffic.
    pub fn lock_count(&self) -> usize {
        self.locks.lock().len()
    }
}

/// Content type for serving a photo. The wire contract promises an image
/// type, so anything unrecognized is served as `image/jpeg`.
pub fn photo_content_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .iter()
        .find(|m| m.type_() == mime::IMAGE)
        .map(|m| m.to_string())
        .unwrap_or_else(|| mime::IMAGE_JPEG.to_string())
}
