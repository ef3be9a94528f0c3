//! Path-addressed blob storage used by the from-storage operation mode.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{Error, Result};

/// Read and write whole blobs by path.
///
/// Errors are surfaced to callers as [`Error::Storage`] (or [`Error::Io`]).
pub trait StorageGateway: Send + Sync {
    fn read(&self, path: &str) -> Result<Vec<u8>>;

    fn write(&self, path: &str, data: &[u8], content_type: &str) -> Result<()>;
}

/// Storage rooted at a local directory.
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a storage path below the root, refusing to leave it.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path.trim_start_matches(['/', '\\']));
        let escapes = relative.components().any(|c| {
            matches!(
                c,
                std::path::Component::ParentDir | std::path::Component::Prefix(_)
            )
        });
        if escapes || path.trim().is_empty() {
            return Err(Error::Storage(format!("invalid storage path: {}", path)));
        }
        Ok(self.root.join(relative))
    }
}

impl StorageGateway for FsStorage {
    fn read(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.resolve(path)?;
        fs::read(&full).map_err(|e| Error::Storage(format!("cannot read {}: {}", path, e)))
    }

    fn write(&self, path: &str, data: &[u8], content_type: &str) -> Result<()> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Storage(format!("cannot create {}: {}", parent.display(), e)))?;
        }
        fs::write(&full, data).map_err(|e| Error::Storage(format!("cannot write {}: {}", path, e)))?;
        log::debug!("wrote {} ({} bytes, {})", path, data.len(), content_type);
        Ok(())
    }
}

/// A stored blob and its declared content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// In-memory storage, handy for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    objects: RwLock<HashMap<String, StoredObject>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a blob directly; same failure mode as [`StorageGateway::write`].
    pub fn insert(
        &self,
        path: impl Into<String>,
        data: Vec<u8>,
        content_type: impl Into<String>,
    ) -> Result<()> {
        self.write_lock()?.insert(
            path.into(),
            StoredObject {
                data,
                content_type: content_type.into(),
            },
        );
        Ok(())
    }

    /// `None` when the path is absent or the lock is poisoned.
    pub fn get(&self, path: &str) -> Option<StoredObject> {
        self.read_lock().ok()?.get(path).cloned()
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .read_lock()
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default();
        paths.sort();
        paths
    }

    fn read_lock(&self) -> Result<RwLockReadGuard<'_, HashMap<String, StoredObject>>> {
        self.objects.read().map_err(|_| poisoned())
    }

    fn write_lock(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, StoredObject>>> {
        self.objects.write().map_err(|_| poisoned())
    }
}

fn poisoned() -> Error {
    Error::Storage("memory storage lock poisoned".to_string())
}

impl StorageGateway for MemoryStorage {
    fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.read_lock()?
            .get(path)
            .map(|object| object.data.clone())
            .ok_or_else(|| Error::Storage(format!("not found: {}", path)))
    }

    fn write(&self, path: &str, data: &[u8], content_type: &str) -> Result<()> {
        self.insert(path, data.to_vec(), content_type)
    }
}
