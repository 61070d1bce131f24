//! In-memory object store, used for local runs without a storage root and
//! by the HTTP tests.

use std::collections::BTreeMap;
use std::sync::RwLock;

use plugdeploy_core::repository::object_store::ObjectStore;
use plugdeploy_types::error::StoreError;

type Buckets = BTreeMap<String, BTreeMap<String, Vec<u8>>>;

#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    buckets: RwLock<Buckets>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Buckets>, StoreError> {
        self.buckets
            .read()
            .map_err(|_| StoreError::Backend("object store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Buckets>, StoreError> {
        self.buckets
            .write()
            .map_err(|_| StoreError::Backend("object store lock poisoned".to_string()))
    }
}

impl ObjectStore for InMemoryObjectStore {
    async fn put(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), StoreError> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        self.write()?
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), body.to_vec());
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        self.read()?
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("{bucket}/{key}")))
    }

    async fn list(&self, bucket: &str, prefix: Option<&str>) -> Result<Vec<String>, StoreError> {
        Ok(self
            .read()?
            .get(bucket)
            .map(|objects| {
                objects
                    .keys()
                    .filter(|k| prefix.is_none_or(|p| k.starts_with(p)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        if let Some(objects) = self.write()?.get_mut(bucket) {
            objects.remove(key);
        }
        Ok(())
    }
}
