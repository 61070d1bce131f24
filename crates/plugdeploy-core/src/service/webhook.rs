//! Push-event handling: walk the plugin root of the pushed repository and
//! deploy what it contains.

use std::time::Duration;

use serde::Serialize;

use plugdeploy_types::error::{DeployError, SourceTreeError};
use plugdeploy_types::plugin::PluginFile;
use plugdeploy_types::webhook::PushEvent;

use crate::plugin::walker::{RepositoryWalker, WalkError};
use crate::repository::graph_store::GraphStore;
use crate::repository::object_store::ObjectStore;
use crate::repository::source_tree::{SourceTreeClient, TreeHandle};
use crate::service::deploy::{DeployReport, DeploymentService};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WebhookOutcome {
    /// The push did not target the default branch.
    Ignored { git_ref: String },
    Deployed(DeployReport),
}

/// Walk `root` and return every file below it as a plugin file.
///
/// Paths lose the `root/` prefix so their first segment is the plugin
/// directory. Files lying directly in `root` belong to no plugin and are
/// skipped.
pub async fn collect_plugin_files<T: TreeHandle>(
    walker: &RepositoryWalker,
    tree: &T,
    root: &str,
) -> Result<Vec<PluginFile>, DeployError> {
    let files = walker
        .collect_files(tree, root)
        .await
        .map_err(walk_error)?;

    let prefix = if root.is_empty() {
        String::new()
    } else {
        format!("{}/", root.trim_end_matches('/'))
    };

    let mut plugin_files = Vec::with_capacity(files.len());
    for (path, contents) in files {
        let Some(relative) = path.strip_prefix(&prefix) else {
            tracing::warn!(path = %path, root, "skipping file outside the plugin root");
            continue;
        };
        if !relative.contains('/') {
            tracing::warn!(path = %path, "skipping file outside any plugin directory");
            continue;
        }
        plugin_files.push(PluginFile::new(relative, contents));
    }
    Ok(plugin_files)
}

fn walk_error(e: WalkError) -> DeployError {
    match &e {
        WalkError::DepthExceeded { .. }
        | WalkError::MissingContent(_)
        | WalkError::Source(SourceTreeError::NotFound(_)) => DeployError::Validation(e.to_string()),
        _ => DeployError::Unexpected(e.to_string()),
    }
}

/// Turns verified push events into deployments.
pub struct WebhookService<S: SourceTreeClient> {
    client: S,
    walker: RepositoryWalker,
    default_branch: String,
    plugin_root: String,
    call_timeout: Duration,
}

impl<S: SourceTreeClient> WebhookService<S> {
    pub fn new(
        client: S,
        walker: RepositoryWalker,
        default_branch: impl Into<String>,
        plugin_root: impl Into<String>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            client,
            walker,
            default_branch: default_branch.into(),
            plugin_root: plugin_root.into(),
            call_timeout,
        }
    }

    /// Deploy the plugin root of the pushed repository when the push targets
    /// its default branch. Other pushes are ignored without any call.
    pub async fn handle_push<O, G>(
        &self,
        event: &PushEvent,
        deployer: &DeploymentService<O, G>,
    ) -> Result<WebhookOutcome, DeployError>
    where
        O: ObjectStore,
        G: GraphStore,
    {
        if !event.targets_default_branch(&self.default_branch) {
            tracing::debug!(git_ref = %event.git_ref, "ignoring push to non-default branch");
            return Ok(WebhookOutcome::Ignored {
                git_ref: event.git_ref.clone(),
            });
        }

        let repo = &event.repository.full_name;
        tracing::info!(repository = %repo, git_ref = %event.git_ref, "deploying plugins from push");

        let tree = match tokio::time::timeout(self.call_timeout, self.client.get_repo(repo)).await {
            Ok(Ok(tree)) => tree,
            Ok(Err(SourceTreeError::NotFound(what))) => {
                return Err(DeployError::Validation(format!("repository not found: {what}")));
            }
            Ok(Err(e)) => return Err(DeployError::Unexpected(e.to_string())),
            Err(_) => {
                return Err(DeployError::Unexpected(format!(
                    "opening repository {repo} timed out"
                )));
            }
        };

        let files = collect_plugin_files(&self.walker, &tree, &self.plugin_root).await?;
        let report = deployer.deploy(files).await?;
        Ok(WebhookOutcome::Deployed(report))
    }
}
