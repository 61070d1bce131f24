//! Object store adapters.
//!
//! - `filesystem`: bucket directories under a storage root
//! - `memory`: process-local buckets
//!
//! [`BucketStore`] picks one of them from configuration.

pub mod filesystem;
pub mod memory;

use std::path::PathBuf;

use plugdeploy_core::repository::object_store::ObjectStore;
use plugdeploy_types::config::StorageBackend;
use plugdeploy_types::error::StoreError;

use self::filesystem::LocalObjectStore;
use self::memory::InMemoryObjectStore;

/// Object store selected by `storage.backend`.
#[derive(Debug)]
pub enum BucketStore {
    Filesystem(LocalObjectStore),
    Memory(InMemoryObjectStore),
}

impl BucketStore {
    pub fn from_backend(backend: StorageBackend, root: PathBuf) -> Self {
        match backend {
            StorageBackend::Filesystem => Self::Filesystem(LocalObjectStore::new(root)),
            StorageBackend::Memory => Self::Memory(InMemoryObjectStore::new()),
        }
    }
}

impl ObjectStore for BucketStore {
    async fn put(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), StoreError> {
        match self {
            Self::Filesystem(store) => store.put(bucket, key, body).await,
            Self::Memory(store) => store.put(bucket, key, body).await,
        }
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        match self {
            Self::Filesystem(store) => store.get(bucket, key).await,
            Self::Memory(store) => store.get(bucket, key).await,
        }
    }

    async fn list(&self, bucket: &str, prefix: Option<&str>) -> Result<Vec<String>, StoreError> {
        match self {
            Self::Filesystem(store) => store.list(bucket, prefix).await,
            Self::Memory(store) => store.list(bucket, prefix).await,
        }
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        match self {
            Self::Filesystem(store) => store.delete(bucket, key).await,
            Self::Memory(store) => store.delete(bucket, key).await,
        }
    }
}
