//! Plugin store: artifact upload, listing, retrieval and deletion by plugin name.
//!
//! Keys follow [`StoredArtifactKey`]: `<plugin_name>/<encoded relative path>`
//! inside the environment's plugin bucket.

use std::collections::BTreeSet;
use std::future::Future;
use std::time::Duration;

use serde::Serialize;

use plugdeploy_types::error::StoreError;
use plugdeploy_types::plugin::{
    PluginFile, SENTINEL_PLUGIN_NAME, StoredArtifactKey, plugin_name_of,
};

use crate::repository::object_store::ObjectStore;

/// Per-file outcome of a batch upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadSummary {
    /// Paths stored successfully, in upload order.
    pub stored: Vec<String>,
    /// Paths whose upload failed.
    pub failed: Vec<String>,
}

/// Plugin artifact storage over an [`ObjectStore`] bucket.
pub struct PluginStore<O: ObjectStore> {
    store: O,
    bucket: String,
    call_timeout: Duration,
}

impl<O: ObjectStore> PluginStore<O> {
    pub fn new(store: O, bucket: impl Into<String>, call_timeout: Duration) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            call_timeout,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn object_store(&self) -> &O {
        &self.store
    }

    async fn timed<T>(
        &self,
        op: &str,
        fut: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        tokio::time::timeout(self.call_timeout, fut)
            .await
            .map_err(|_| StoreError::Timeout(format!("{op} in bucket {}", self.bucket)))?
    }

    /// Store one file under its artifact key.
    pub async fn upload(&self, path: &str, contents: &[u8]) -> Result<StoredArtifactKey, StoreError> {
        let key = StoredArtifactKey::parse(path).map_err(|e| StoreError::InvalidKey(e.to_string()))?;
        let object_key = key.to_key();
        self.timed("put", self.store.put(&self.bucket, &object_key, contents))
            .await?;
        tracing::debug!(path, key = %object_key, bucket = %self.bucket, "stored plugin artifact");
        Ok(key)
    }

    /// Upload every file, continuing past failures.
    ///
    /// Each failure is logged and reported in [`UploadSummary::failed`].
    pub async fn upload_all(&self, files: &[PluginFile]) -> UploadSummary {
        let mut summary = UploadSummary::default();
        for file in files {
            match self.upload(&file.path, &file.contents).await {
                Ok(_) => summary.stored.push(file.path.clone()),
                Err(e) => {
                    tracing::error!(path = %file.path, bucket = %self.bucket, error = %e, "failed to store plugin artifact");
                    summary.failed.push(file.path.clone());
                }
            }
        }
        summary
    }

    /// Distinct plugin names present in the bucket, sorted, sentinel excluded.
    pub async fn list(&self) -> Result<Vec<String>, StoreError> {
        let keys = self.timed("list", self.store.list(&self.bucket, None)).await?;
        let names: BTreeSet<String> = keys
            .iter()
            .map(|k| plugin_name_of(k))
            .filter(|name| !name.is_empty() && *name != SENTINEL_PLUGIN_NAME)
            .map(str::to_string)
            .collect();
        Ok(names.into_iter().collect())
    }

    /// Delete every artifact of `plugin_name`. Returns how many keys were removed.
    pub async fn delete(&self, plugin_name: &str) -> Result<usize, StoreError> {
        let keys = self.plugin_keys(plugin_name).await?;
        for key in &keys {
            self.timed("delete", self.store.delete(&self.bucket, key)).await?;
        }
        tracing::info!(plugin = plugin_name, deleted = keys.len(), "deleted plugin artifacts");
        Ok(keys.len())
    }

    /// Download every artifact of `plugin_name` with its original path.
    pub async fn fetch(&self, plugin_name: &str) -> Result<Vec<PluginFile>, StoreError> {
        let mut files = Vec::new();
        for key in self.plugin_keys(plugin_name).await? {
            let Ok(artifact) = StoredArtifactKey::from_key(&key) else {
                tracing::warn!(key = %key, "skipping object with undecodable key");
                continue;
            };
            let contents = self.timed("get", self.store.get(&self.bucket, &key)).await?;
            files.push(PluginFile::new(artifact.path(), contents));
        }
        Ok(files)
    }

    async fn plugin_keys(&self, plugin_name: &str) -> Result<Vec<String>, StoreError> {
        if plugin_name.is_empty() {
            return Ok(Vec::new());
        }
        let prefix = format!("{plugin_name}/");
        let keys = self
            .timed("list", self.store.list(&self.bucket, Some(&prefix)))
            .await?;
        Ok(keys
            .into_iter()
            .filter(|k| plugin_name_of(k) == plugin_name)
            .collect())
    }
}
