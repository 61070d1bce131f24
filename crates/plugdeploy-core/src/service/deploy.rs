//! Deployment service.
//!
//! Runs one deployment end to end: ingest, evaluate, provision the schema,
//! then upload every artifact. The schema is always applied before the first
//! upload, and a deployment whose schema fails never uploads anything.

use std::time::Duration;

use serde::Serialize;

use plugdeploy_types::error::DeployError;
use plugdeploy_types::plugin::PluginFile;

use crate::plugin::ingest::ingest;
use crate::plugin::store::PluginStore;
use crate::repository::graph_store::GraphStore;
use crate::repository::object_store::ObjectStore;
use crate::schema::builder::SchemaProvisioner;
use crate::schema::evaluator::evaluate_all;

/// Summary of a successful deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeployReport {
    pub deployed_types: Vec<String>,
    pub excluded_types: Vec<String>,
    pub stored_artifacts: usize,
}

/// Deployment pipeline over one object store bucket and one graph store.
pub struct DeploymentService<O: ObjectStore, G: GraphStore> {
    plugin_store: PluginStore<O>,
    provisioner: SchemaProvisioner<G>,
    evaluation_timeout: Duration,
}

impl<O: ObjectStore, G: GraphStore> DeploymentService<O, G> {
    pub fn new(
        plugin_store: PluginStore<O>,
        provisioner: SchemaProvisioner<G>,
        evaluation_timeout: Duration,
    ) -> Self {
        Self {
            plugin_store,
            provisioner,
            evaluation_timeout,
        }
    }

    pub fn plugin_store(&self) -> &PluginStore<O> {
        &self.plugin_store
    }

    pub fn provisioner(&self) -> &SchemaProvisioner<G> {
        &self.provisioner
    }

    /// Deploy a set of plugin files keyed by `<plugin_name>/<relative path>`.
    pub async fn deploy(&self, files: Vec<PluginFile>) -> Result<DeployReport, DeployError> {
        let ingested = ingest(files)?;
        tracing::info!(
            plugins = ?ingested.plugin_names(),
            files = ingested.files.len(),
            schema_sources = ingested.schema_sources.len(),
            "starting deployment"
        );

        let sources = ingested.schema_sources;
        let definitions =
            run_blocking(self.evaluation_timeout, move || evaluate_all(&sources)).await??;

        let outcome = self.provisioner.provision(definitions).await?;

        let summary = self.plugin_store.upload_all(&ingested.files).await;
        if !summary.failed.is_empty() {
            tracing::error!(
                stored = summary.stored.len(),
                failed = ?summary.failed,
                "deployment finished with storage failures"
            );
            return Err(DeployError::Storage {
                failed: summary.failed,
            });
        }

        tracing::info!(
            deployed_types = ?outcome.deployed,
            excluded_types = ?outcome.excluded,
            stored = summary.stored.len(),
            "deployment complete"
        );

        Ok(DeployReport {
            deployed_types: outcome.deployed,
            excluded_types: outcome.excluded,
            stored_artifacts: summary.stored.len(),
        })
    }

    /// Names of every stored plugin, sorted.
    pub async fn list_plugins(&self) -> Result<Vec<String>, DeployError> {
        self.plugin_store
            .list()
            .await
            .map_err(|e| DeployError::Unexpected(e.to_string()))
    }

    /// Every stored artifact of `name` with its original path. Unknown names
    /// yield an empty list.
    pub async fn fetch_plugin(&self, name: &str) -> Result<Vec<PluginFile>, DeployError> {
        self.plugin_store
            .fetch(name)
            .await
            .map_err(|e| DeployError::Unexpected(e.to_string()))
    }

    /// Delete every artifact of each named plugin. Unknown names are a no-op.
    pub async fn delete_plugins(&self, names: &[String]) -> Result<usize, DeployError> {
        let mut deleted = 0;
        for name in names {
            deleted += self
                .plugin_store
                .delete(name)
                .await
                .map_err(|e| DeployError::Unexpected(e.to_string()))?;
        }
        Ok(deleted)
    }
}

/// Run CPU-bound work on the blocking pool, bounded by `limit`.
///
/// A panic in `task` or an elapsed limit is `DeployError::Unexpected`.
async fn run_blocking<T, F>(limit: Duration, task: F) -> Result<T, DeployError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    match tokio::time::timeout(limit, tokio::task::spawn_blocking(task)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(join_error)) => Err(DeployError::Unexpected(format!(
            "schema evaluation task failed: {join_error}"
        ))),
        Err(_) => Err(DeployError::Unexpected(format!(
            "schema evaluation timed out after {}ms",
            limit.as_millis()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use plugdeploy_types::schema::BuiltinNodeSet;

    use super::*;
    use crate::testing::{EventLog, MemoryObjectStore, RecordingGraph};

    const BUCKET: &str = "local-model-plugins-bucket";

    const TYPE_X_SOURCE: &str = "\
nodes:
  - type_name: TypeX
    properties:
      - { name: node_key, type: string, index: [hash], upsert: true }
";

    const FILE_AND_Y_SOURCE: &str = "\
nodes:
  - type_name: File
    properties:
      - { name: file_path, type: string }
  - type_name: TypeY
    properties:
      - { name: y_key, type: string }
";

    fn service_with(
        store: MemoryObjectStore,
        graph: RecordingGraph,
    ) -> DeploymentService<MemoryObjectStore, RecordingGraph> {
        DeploymentService::new(
            PluginStore::new(store, BUCKET, Duration::from_secs(5)),
            SchemaProvisioner::new(graph, BuiltinNodeSet::default(), Duration::from_secs(5)),
            Duration::from_secs(5),
        )
    }

    fn service(log: &EventLog) -> DeploymentService<MemoryObjectStore, RecordingGraph> {
        service_with(
            MemoryObjectStore::new(log.clone()),
            RecordingGraph::new(log.clone()),
        )
    }

    fn applied(service: &DeploymentService<MemoryObjectStore, RecordingGraph>) -> Vec<String> {
        service.provisioner().graph().applied.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn test_deploy_applies_schema_and_stores_artifacts() {
        let log = EventLog::default();
        let service = service(&log);

        let report = service
            .deploy(vec![
                PluginFile::new("myplugin/schema.py", TYPE_X_SOURCE),
                PluginFile::new("myplugin/plugin.py", "def run(): pass"),
            ])
            .await
            .unwrap();

        assert_eq!(report.deployed_types, vec!["TypeX"]);
        assert_eq!(report.stored_artifacts, 2);

        let applied = applied(&service);
        assert_eq!(applied.len(), 1);
        assert!(applied[0].contains("type TypeX"));

        let keys = service.plugin_store().object_store().keys(BUCKET);
        assert_eq!(keys.len(), 2);
        assert!(keys.iter().all(|k| k.starts_with("myplugin/")));
    }

    #[tokio::test]
    async fn test_schema_applied_before_any_upload() {
        let log = EventLog::default();
        let service = service(&log);

        service
            .deploy(vec![
                PluginFile::new("myplugin/plugin.py", "code"),
                PluginFile::new("myplugin/schema.py", TYPE_X_SOURCE),
            ])
            .await
            .unwrap();

        assert_eq!(
            log.events(),
            vec!["alter", "put myplugin/plugin.py", "put myplugin/schema.py"]
        );
    }

    #[tokio::test]
    async fn test_builtin_definitions_are_excluded() {
        let log = EventLog::default();
        let service = service(&log);

        let report = service
            .deploy(vec![PluginFile::new("files/schema.py", FILE_AND_Y_SOURCE)])
            .await
            .unwrap();

        assert_eq!(report.deployed_types, vec!["TypeY"]);
        assert_eq!(report.excluded_types, vec!["File"]);

        let applied = applied(&service);
        assert!(applied[0].contains("type TypeY"));
        assert!(!applied[0].contains("type File"));
    }

    #[tokio::test]
    async fn test_no_schema_sources_skips_alter_but_stores_files() {
        let log = EventLog::default();
        let service = service(&log);

        let report = service
            .deploy(vec![PluginFile::new("alpha/plugin.py", "code")])
            .await
            .unwrap();

        assert!(report.deployed_types.is_empty());
        assert_eq!(log.events(), vec!["put alpha/plugin.py"]);
    }

    #[tokio::test]
    async fn test_rejected_schema_uploads_nothing() {
        let log = EventLog::default();
        let service = service_with(
            MemoryObjectStore::new(log.clone()),
            RecordingGraph::rejecting(log.clone()),
        );

        let err = service
            .deploy(vec![
                PluginFile::new("alpha/schema.py", TYPE_X_SOURCE),
                PluginFile::new("alpha/plugin.py", "code"),
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::SchemaApply(_)));
        assert_eq!(log.events(), vec!["alter rejected"]);
        assert!(service.plugin_store().object_store().keys(BUCKET).is_empty());
    }

    #[tokio::test]
    async fn test_evaluation_failure_touches_nothing() {
        let log = EventLog::default();
        let service = service(&log);

        let err = service
            .deploy(vec![
                PluginFile::new("alpha/schema.py", "nodes: [not, a, node]"),
                PluginFile::new("alpha/plugin.py", "code"),
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::Evaluation { path, .. } if path == "alpha/schema.py"));
        assert!(log.events().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_path_is_validation_error() {
        let log = EventLog::default();
        let service = service(&log);

        let err = service
            .deploy(vec![PluginFile::new("loose.py", "code")])
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::Validation(_)));
        assert!(log.events().is_empty());
    }

    #[tokio::test]
    async fn test_unstorable_plugin_name_fails_before_alter() {
        let log = EventLog::default();
        let service = service(&log);

        let err = service
            .deploy(vec![
                PluginFile::new("../schema.py", TYPE_X_SOURCE),
                PluginFile::new("./plugin.py", "code"),
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::Validation(_)));
        assert!(log.events().is_empty());
        assert!(applied(&service).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_upload_is_reported_as_failed() {
        let log = EventLog::default();
        let service = service_with(
            MemoryObjectStore::new(log.clone()).stalling_on("alpha/b.py"),
            RecordingGraph::new(log.clone()),
        );

        let err = service
            .deploy(vec![
                PluginFile::new("alpha/a.py", "a"),
                PluginFile::new("alpha/b.py", "b"),
                PluginFile::new("alpha/c.py", "c"),
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::Storage { failed } if failed == vec!["alpha/b.py"]));
        assert_eq!(log.events(), vec!["put alpha/a.py", "put alpha/c.py"]);
    }

    #[tokio::test]
    async fn test_slow_blocking_work_times_out() {
        let err = run_blocking(Duration::from_millis(20), || {
            std::thread::sleep(Duration::from_millis(300));
        })
        .await
        .unwrap_err();

        assert!(matches!(err, DeployError::Unexpected(msg) if msg.contains("timed out")));
    }

    #[tokio::test]
    async fn test_panicking_blocking_work_is_unexpected() {
        let err = run_blocking(Duration::from_secs(5), || -> usize { panic!("boom") })
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::Unexpected(msg) if msg.contains("task failed")));
    }

    #[tokio::test]
    async fn test_storage_failures_are_aggregated() {
        let log = EventLog::default();
        let service = service_with(
            MemoryObjectStore::new(log.clone()).failing_on("alpha/b.py"),
            RecordingGraph::new(log.clone()),
        );

        let err = service
            .deploy(vec![
                PluginFile::new("alpha/a.py", "a"),
                PluginFile::new("alpha/b.py", "b"),
                PluginFile::new("alpha/c.py", "c"),
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::Storage { failed } if failed == vec!["alpha/b.py"]));
        assert_eq!(log.events(), vec!["put alpha/a.py", "put alpha/c.py"]);
    }

    #[tokio::test]
    async fn test_list_and_delete_plugins() {
        let log = EventLog::default();
        let service = service(&log);

        service
            .deploy(vec![PluginFile::new("alpha/a.py", "a"), PluginFile::new("alpha/b.py", "b")])
            .await
            .unwrap();
        service
            .deploy(vec![PluginFile::new("beta/a.py", "a")])
            .await
            .unwrap();

        assert_eq!(service.list_plugins().await.unwrap(), vec!["alpha", "beta"]);

        let fetched = service.fetch_plugin("alpha").await.unwrap();
        let paths: Vec<_> = fetched.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths.len(), 2);
        assert!(paths.contains(&"alpha/a.py") && paths.contains(&"alpha/b.py"));
        assert!(service.fetch_plugin("missing").await.unwrap().is_empty());

        let deleted = service
            .delete_plugins(&["alpha".to_string(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(service.list_plugins().await.unwrap(), vec!["beta"]);
    }
}
