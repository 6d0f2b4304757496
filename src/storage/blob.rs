//! Blob stores for uploaded audio

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

use crate::config::Settings;
use crate::{NotescribeError, Result};

const KEY_PREFIX: &str = "uploads";

/// Opaque key returned by a blob store at write time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileReference(String);

impl FileReference {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Persist bytes and return the key they can be read back with.
    async fn write(
        &self,
        bytes: Vec<u8>,
        original_filename: &str,
        content_type: &str,
    ) -> Result<FileReference>;

    /// Resolve a key to the exact bytes that were written.
    async fn read(&self, reference: &FileReference) -> Result<Vec<u8>>;

    /// Drop a blob. Deleting a missing key is `NotFound`.
    async fn delete(&self, reference: &FileReference) -> Result<()>;
}

/// Build a fresh key, keeping the extension of the uploaded filename.
fn new_key(original_filename: &str) -> String {
    let ext = Path::new(original_filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();
    format!("{}/{}{}", KEY_PREFIX, Uuid::new_v4(), ext)
}

/// Blob store backed by a local directory.
///
/// Keys look like `uploads/<uuid>.<ext>`; the content type is kept in a
/// `.content-type` sidecar next to the blob.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| {
            NotescribeError::Storage(format!(
                "Failed to create uploads directory {}: {}",
                root.display(),
                e
            ))
        })?;
        Ok(Self { root })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::open(settings.uploads_dir())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a key to a path under the root, rejecting anything that escapes it.
    fn resolve(&self, reference: &FileReference) -> Result<PathBuf> {
        let name = reference
            .as_str()
            .strip_prefix(KEY_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| {
                NotescribeError::Validation(format!("Unknown file reference: {}", reference))
            })?;

        let relative = Path::new(name);
        let is_plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if name.is_empty() || !is_plain {
            return Err(NotescribeError::Validation(format!(
                "Unknown file reference: {}",
                reference
            )));
        }

        Ok(self.root.join(relative))
    }

    /// Content type recorded when the blob was written.
    pub async fn content_type(&self, reference: &FileReference) -> Result<String> {
        let path = self.resolve(reference)?;
        let sidecar = sidecar_path(&path);
        Ok(tokio::fs::read_to_string(sidecar).await?)
    }
}

fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".content-type");
    PathBuf::from(name)
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn write(
        &self,
        bytes: Vec<u8>,
        original_filename: &str,
        content_type: &str,
    ) -> Result<FileReference> {
        let reference = FileReference::new(new_key(original_filename));
        let path = self.resolve(&reference)?;

        tokio::fs::write(&path, &bytes).await.map_err(|e| {
            NotescribeError::Storage(format!("Failed to write {}: {}", path.display(), e))
        })?;
        tokio::fs::write(sidecar_path(&path), content_type)
            .await
            .map_err(|e| {
                NotescribeError::Storage(format!(
                    "Failed to write content type for {}: {}",
                    path.display(),
                    e
                ))
            })?;

        tracing::debug!("Stored {} bytes as {}", bytes.len(), reference);
        Ok(reference)
    }

    async fn read(&self, reference: &FileReference) -> Result<Vec<u8>> {
        let path = self.resolve(reference)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(NotescribeError::NotFound(format!("Stored file {}", reference)))
            }
            Err(e) => Err(NotescribeError::Storage(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn delete(&self, reference: &FileReference) -> Result<()> {
        let path = self.resolve(reference)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(NotescribeError::NotFound(format!(
                    "Stored file {}",
                    reference
                )));
            }
            Err(e) => {
                return Err(NotescribeError::Storage(format!(
                    "Failed to delete {}: {}",
                    path.display(),
                    e
                )));
            }
        }

        if let Err(e) = tokio::fs::remove_file(sidecar_path(&path)).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to delete content type for {}: {}", reference, e);
            }
        }
        tracing::debug!("Deleted {}", reference);
        Ok(())
    }
}

/// In-process blob store.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<FileReference, (Vec<u8>, String)>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn write(
        &self,
        bytes: Vec<u8>,
        original_filename: &str,
        content_type: &str,
    ) -> Result<FileReference> {
        let reference = FileReference::new(new_key(original_filename));
        self.blobs
            .lock()
            .map_err(|_| NotescribeError::Storage("Blob map lock poisoned".to_string()))?
            .insert(reference.clone(), (bytes, content_type.to_string()));
        Ok(reference)
    }

    async fn read(&self, reference: &FileReference) -> Result<Vec<u8>> {
        self.blobs
            .lock()
            .map_err(|_| NotescribeError::Storage("Blob map lock poisoned".to_string()))?
            .get(reference)
            .map(|(bytes, _)| bytes.clone())
            .ok_or_else(|| NotescribeError::NotFound(format!("Stored file {}", reference)))
    }

    async fn delete(&self, reference: &FileReference) -> Result<()> {
        self.blobs
            .lock()
            .map_err(|_| NotescribeError::Storage("Blob map lock poisoned".to_string()))?
            .remove(reference)
            .map(|_| ())
            .ok_or_else(|| NotescribeError::NotFound(format!("Stored file {}", reference)))
    }
}
