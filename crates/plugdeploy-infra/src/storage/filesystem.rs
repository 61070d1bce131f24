//! Local filesystem object store.
//!
//! Each bucket is a directory under the storage root and each `/`-separated
//! key segment is a path component:
//!
//! ```text
//! {root}/{bucket}/
//!   alpha/
//!     c2NoZW1hLnB5          # base64url("schema.py")
//!     bGliL3V0aWwucHk       # base64url("lib/util.py")
//!   __init__.py             # bucket sentinel
//! ```

use std::path::{Component, Path, PathBuf};

use plugdeploy_core::repository::object_store::ObjectStore;
use plugdeploy_types::error::StoreError;

/// Filesystem-backed [`ObjectStore`].
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn bucket_dir(&self, bucket: &str) -> Result<PathBuf, StoreError> {
        check_segments(bucket)?;
        if bucket.contains('/') {
            return Err(StoreError::InvalidKey(format!("bucket name '{bucket}'")));
        }
        Ok(self.root.join(bucket))
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StoreError> {
        check_segments(key)?;
        Ok(self.bucket_dir(bucket)?.join(key))
    }
}

/// Reject keys that would escape the bucket directory.
fn check_segments(key: &str) -> Result<(), StoreError> {
    let invalid = key.is_empty()
        || key.split('/').any(|s| s.is_empty())
        || Path::new(key)
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
    if invalid {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

fn io_error(path: &Path, err: std::io::Error) -> StoreError {
    StoreError::Io(format!("{}: {err}", path.display()))
}

impl ObjectStore for LocalObjectStore {
    async fn put(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), StoreError> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(parent, e))?;
        }
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| io_error(&path, e))?;
        tracing::trace!(bucket, key, bytes = body.len(), "wrote object");
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.object_path(bucket, key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(format!("{bucket}/{key}")))
            }
            Err(e) => Err(io_error(&path, e)),
        }
    }

    async fn list(&self, bucket: &str, prefix: Option<&str>) -> Result<Vec<String>, StoreError> {
        let bucket_dir = self.bucket_dir(bucket)?;
        let mut keys = Vec::new();
        let mut pending: Vec<(PathBuf, String)> = vec![(bucket_dir, String::new())];

        while let Some((dir, key_prefix)) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(io_error(&dir, e)),
            };
            while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(&dir, e))? {
                let Ok(name) = entry.file_name().into_string() else {
                    tracing::warn!(path = %entry.path().display(), "skipping non-UTF-8 object name");
                    continue;
                };
                let key = format!("{key_prefix}{name}");
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| io_error(&entry.path(), e))?;
                if file_type.is_dir() {
                    pending.push((entry.path(), format!("{key}/")));
                } else if prefix.is_none_or(|p| key.starts_with(p)) {
                    keys.push(key);
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        let path = self.object_path(bucket, key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(io_error(&path, e)),
        }

        // Drop directories emptied by the delete, never the bucket itself.
        let bucket_dir = self.bucket_dir(bucket)?;
        let mut dir = path.parent().map(Path::to_path_buf);
        while let Some(current) = dir {
            if current == bucket_dir || tokio::fs::remove_dir(&current).await.is_err() {
                break;
            }
            dir = current.parent().map(Path::to_path_buf);
        }
        Ok(())
    }
}
