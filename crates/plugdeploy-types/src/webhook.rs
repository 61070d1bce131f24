//! Source-control push event payload.

use serde::{Deserialize, Serialize};

/// The subset of a push event the deployer reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushEvent {
    /// Fully qualified ref that was pushed, e.g. `refs/heads/main`.
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub repository: PushRepository,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushRepository {
    /// `owner/name`.
    pub full_name: String,
    #[serde(default)]
    pub default_branch: Option<String>,
}

impl PushEvent {
    /// Whether this push targets the repository's default branch.
    ///
    /// The branch reported by the event wins; `fallback_branch` is used when
    /// the event does not carry one.
    pub fn targets_default_branch(&self, fallback_branch: &str) -> bool {
        let branch = self
            .repository
            .default_branch
            .as_deref()
            .unwrap_or(fallback_branch);
        self.git_ref == format!("refs/heads/{branch}")
    }
}
