//! In-memory port implementations shared by the unit tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use plugdeploy_types::error::{GraphStoreError, StoreError};
use plugdeploy_types::plugin::StoredArtifactKey;

use crate::repository::graph_store::GraphStore;
use crate::repository::object_store::ObjectStore;

/// Ordered record of side effects across fakes.
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<BTreeMap<(String, String), Vec<u8>>>,
    failing_paths: HashSet<String>,
    stalling_paths: HashSet<String>,
    log: EventLog,
}

impl MemoryObjectStore {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            ..Default::default()
        }
    }

    /// Make `put` fail for the artifact stored from `path`.
    pub fn failing_on(mut self, path: &str) -> Self {
        self.failing_paths.insert(path.to_string());
        self
    }

    /// Make `put` never complete for the artifact stored from `path`.
    pub fn stalling_on(mut self, path: &str) -> Self {
        self.stalling_paths.insert(path.to_string());
        self
    }

    pub fn insert_raw(&self, bucket: &str, key: &str, body: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), body.to_vec());
    }

    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.objects
            .lock()
            .unwrap()
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect()
    }
}

impl ObjectStore for MemoryObjectStore {
    async fn put(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), StoreError> {
        let path = StoredArtifactKey::from_key(key).map(|k| k.path()).unwrap_or_default();
        if self.failing_paths.contains(&path) {
            return Err(StoreError::Backend(format!("refusing {key}")));
        }
        if self.stalling_paths.contains(&path) {
            std::future::pending::<()>().await;
        }
        self.log.push(format!("put {path}"));
        self.insert_raw(bucket, key, body);
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn list(&self, bucket: &str, prefix: Option<&str>) -> Result<Vec<String>, StoreError> {
        Ok(self
            .keys(bucket)
            .into_iter()
            .filter(|k| prefix.is_none_or(|p| k.starts_with(p)))
            .collect())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        self.log.push(format!("delete {key}"));
        self.objects
            .lock()
            .unwrap()
            .remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingGraph {
    pub applied: Mutex<Vec<String>>,
    pub reject: bool,
    log: EventLog,
}

impl RecordingGraph {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            ..Default::default()
        }
    }

    pub fn rejecting(log: EventLog) -> Self {
        Self {
            reject: true,
            log,
            ..Default::default()
        }
    }
}

impl GraphStore for RecordingGraph {
    async fn alter(&self, schema: &str) -> Result<(), GraphStoreError> {
        if self.reject {
            self.log.push("alter rejected");
            return Err(GraphStoreError::Rejected("invalid schema".to_string()));
        }
        self.log.push("alter");
        self.applied.lock().unwrap().push(schema.to_string());
        Ok(())
    }
}
