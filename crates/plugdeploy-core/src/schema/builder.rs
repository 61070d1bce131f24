//! Schema differ and builder.
//!
//! Removes built-in types from a deployment's definitions, merges the rest
//! into one schema document, and applies it to the graph store as a single
//! atomic alter. Alters against one store are serialized.

use std::time::Duration;

use tokio::sync::Mutex;

use plugdeploy_types::error::{DeployError, GraphStoreError};
use plugdeploy_types::schema::{BuiltinNodeSet, SchemaDefinition};

use crate::repository::graph_store::GraphStore;

pub const TYPE_SECTION_MARKER: &str = "# Type Definitions";
pub const SCHEMA_SECTION_MARKER: &str = "# Schema Definitions";

/// Outcome of a provisioning call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionOutcome {
    /// Type names included in the applied document, in order.
    pub deployed: Vec<String>,
    /// Type names dropped because they are built in.
    pub excluded: Vec<String>,
}

/// Split definitions into (deployable, excluded built-in names).
pub fn exclude_builtins(
    definitions: Vec<SchemaDefinition>,
    builtins: &BuiltinNodeSet,
) -> (Vec<SchemaDefinition>, Vec<String>) {
    let mut excluded = Vec::new();
    let deployed = definitions
        .into_iter()
        .filter(|d| {
            let builtin = builtins.contains(&d.type_name);
            if builtin {
                excluded.push(d.type_name.clone());
            }
            !builtin
        })
        .collect();
    (deployed, excluded)
}

/// Merge definitions into one document: every type block, then every
/// predicate block, each under its section marker.
pub fn build_schema_document(definitions: &[SchemaDefinition]) -> String {
    let types: Vec<&str> = definitions
        .iter()
        .map(|d| d.type_declaration.as_str())
        .collect();
    let schemas: Vec<&str> = definitions
        .iter()
        .map(|d| d.schema_declaration.as_str())
        .collect();

    format!(
        "{TYPE_SECTION_MARKER}\n{}\n\n{SCHEMA_SECTION_MARKER}\n{}\n",
        types.join("\n\n"),
        schemas.join("\n\n")
    )
}

/// Applies merged schemas to one graph store target.
///
/// Holds the single-writer lock for that target: concurrent deployments
/// queue on it instead of racing their alters.
pub struct SchemaProvisioner<G: GraphStore> {
    graph: G,
    builtins: BuiltinNodeSet,
    alter_timeout: Duration,
    write_lock: Mutex<()>,
}

impl<G: GraphStore> SchemaProvisioner<G> {
    pub fn new(graph: G, builtins: BuiltinNodeSet, alter_timeout: Duration) -> Self {
        Self {
            graph,
            builtins,
            alter_timeout,
            write_lock: Mutex::new(()),
        }
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    /// Exclude, build, and apply. Nothing is sent when no type remains.
    pub async fn provision(
        &self,
        definitions: Vec<SchemaDefinition>,
    ) -> Result<ProvisionOutcome, DeployError> {
        let (deployed, excluded) = exclude_builtins(definitions, &self.builtins);
        if !excluded.is_empty() {
            tracing::warn!(types = ?excluded, "skipping built-in node types");
        }

        let outcome = ProvisionOutcome {
            deployed: deployed.iter().map(|d| d.type_name.clone()).collect(),
            excluded,
        };

        if deployed.is_empty() {
            tracing::debug!("no schema definitions to deploy");
            return Ok(outcome);
        }

        let document = build_schema_document(&deployed);
        tracing::info!(types = ?outcome.deployed, "deploying schemas");

        let _guard = self.write_lock.lock().await;
        match tokio::time::timeout(self.alter_timeout, self.graph.alter(&document)).await {
            Ok(Ok(())) => Ok(outcome),
            Ok(Err(GraphStoreError::Rejected(reason))) => Err(DeployError::SchemaApply(reason)),
            Ok(Err(e @ GraphStoreError::Transport(_))) => Err(DeployError::SchemaApply(e.to_string())),
            Err(_) => Err(DeployError::Unexpected(format!(
                "graph store alter timed out after {}s",
                self.alter_timeout.as_secs()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn def(name: &str) -> SchemaDefinition {
        SchemaDefinition {
            type_name: name.to_string(),
            type_declaration: format!("type {name} {{\n  {}_key\n}}", name.to_lowercase()),
            schema_declaration: format!("{}_key: string .", name.to_lowercase()),
        }
    }

    /// Records every alter; optionally rejects or stalls.
    #[derive(Default)]
    struct FakeGraph {
        applied: std::sync::Mutex<Vec<String>>,
        reject: bool,
        delay: Option<Duration>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl GraphStore for FakeGraph {
        async fn alter(&self, schema: &str) -> Result<(), GraphStoreError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.reject {
                return Err(GraphStoreError::Rejected("bad predicate".to_string()));
            }
            self.applied.lock().unwrap().push(schema.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_exclude_builtins_is_set_difference() {
        let builtins = BuiltinNodeSet::default();
        let (deployed, excluded) =
            exclude_builtins(vec![def("TypeX"), def("File"), def("TypeY"), def("Risk")], &builtins);

        let names: Vec<_> = deployed.iter().map(|d| d.type_name.as_str()).collect();
        assert_eq!(names, vec!["TypeX", "TypeY"]);
        assert_eq!(excluded, vec!["File", "Risk"]);
        assert!(deployed.iter().all(|d| !builtins.contains(&d.type_name)));
    }

    #[test]
    fn test_exclude_builtins_for_every_builtin() {
        let builtins = BuiltinNodeSet::default();
        let mut all: Vec<_> = builtins.iter().map(def).collect();
        all.push(def("Custom"));

        let (deployed, excluded) = exclude_builtins(all, &builtins);
        assert_eq!(deployed, vec![def("Custom")]);
        let excluded: HashSet<_> = excluded.into_iter().collect();
        assert_eq!(excluded.len(), builtins.len());
    }

    #[test]
    fn test_build_schema_document_layout() {
        let doc = build_schema_document(&[def("A"), def("B")]);
        assert_eq!(
            doc,
            "# Type Definitions\n\
             type A {\n  a_key\n}\n\n\
             type B {\n  b_key\n}\n\n\
             # Schema Definitions\n\
             a_key: string .\n\n\
             b_key: string .\n"
        );
    }

    #[tokio::test]
    async fn test_provision_applies_one_document() {
        let provisioner = SchemaProvisioner::new(
            FakeGraph::default(),
            BuiltinNodeSet::default(),
            Duration::from_secs(5),
        );

        let outcome = provisioner
            .provision(vec![def("TypeX"), def("File")])
            .await
            .unwrap();

        assert_eq!(outcome.deployed, vec!["TypeX"]);
        assert_eq!(outcome.excluded, vec!["File"]);

        let applied = provisioner.graph.applied.lock().unwrap();
        assert_eq!(applied.len(), 1);
        assert!(applied[0].contains("type TypeX"));
        assert!(!applied[0].contains("type File"));
    }

    #[tokio::test]
    async fn test_provision_skips_alter_when_only_builtins() {
        let provisioner = SchemaProvisioner::new(
            FakeGraph::default(),
            BuiltinNodeSet::default(),
            Duration::from_secs(5),
        );

        let outcome = provisioner.provision(vec![def("Process")]).await.unwrap();
        assert!(outcome.deployed.is_empty());
        assert!(provisioner.graph.applied.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_provision_rejection_is_schema_apply_error() {
        let graph = FakeGraph {
            reject: true,
            ..Default::default()
        };
        let provisioner =
            SchemaProvisioner::new(graph, BuiltinNodeSet::default(), Duration::from_secs(5));

        let err = provisioner.provision(vec![def("TypeX")]).await.unwrap_err();
        assert!(matches!(err, DeployError::SchemaApply(reason) if reason == "bad predicate"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_provision_timeout_is_unexpected() {
        let graph = FakeGraph {
            delay: Some(Duration::from_secs(120)),
            ..Default::default()
        };
        let provisioner =
            SchemaProvisioner::new(graph, BuiltinNodeSet::default(), Duration::from_secs(1));

        let err = provisioner.provision(vec![def("TypeX")]).await.unwrap_err();
        assert!(matches!(err, DeployError::Unexpected(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_provisions_are_serialized() {
        let graph = FakeGraph {
            delay: Some(Duration::from_millis(20)),
            ..Default::default()
        };
        let provisioner = Arc::new(SchemaProvisioner::new(
            graph,
            BuiltinNodeSet::default(),
            Duration::from_secs(5),
        ));

        let mut handles = Vec::new();
        for i in 0..4 {
            let provisioner = Arc::clone(&provisioner);
            handles.push(tokio::spawn(async move {
                provisioner.provision(vec![def(&format!("T{i}"))]).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(provisioner.graph.max_in_flight.load(Ordering::SeqCst), 1);
        assert_eq!(provisioner.graph.applied.lock().unwrap().len(), 4);
    }
}
