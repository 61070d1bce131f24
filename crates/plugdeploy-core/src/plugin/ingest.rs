//! Plugin ingestor: splits a flat file map into schema sources and artifacts.

use std::collections::BTreeSet;

use plugdeploy_types::error::DeployError;
use plugdeploy_types::plugin::{PluginFile, StoredArtifactKey};

/// Result of ingesting one deployment's files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestedPlugins {
    /// Files whose path marks them as schema sources, in input order.
    pub schema_sources: Vec<PluginFile>,
    /// Every submitted file, schema sources included, in input order.
    pub files: Vec<PluginFile>,
}

impl IngestedPlugins {
    /// Distinct plugin names touched by this deployment.
    pub fn plugin_names(&self) -> BTreeSet<String> {
        self.files
            .iter()
            .filter_map(|f| StoredArtifactKey::parse(&f.path).ok())
            .map(|k| k.plugin_name)
            .collect()
    }
}

/// Validate every path and partition the files.
///
/// Fails with `DeployError::Validation` on the first path that does not name
/// a plugin and a file below it. Nothing is partitioned in that case.
pub fn ingest(files: Vec<PluginFile>) -> Result<IngestedPlugins, DeployError> {
    for file in &files {
        StoredArtifactKey::parse(&file.path)
            .map_err(|e| DeployError::Validation(e.to_string()))?;
    }

    let schema_sources = files
        .iter()
        .filter(|f| f.is_schema_source())
        .cloned()
        .collect();

    Ok(IngestedPlugins {
        schema_sources,
        files,
    })
}
