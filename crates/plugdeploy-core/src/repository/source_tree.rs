//! Source-control tree client traits.

use plugdeploy_types::error::SourceTreeError;

/// One node returned by listing a tree path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Path from the repository root.
    pub path: String,
    /// Inline content for files, when the listing carries it.
    pub content: Option<Vec<u8>>,
    pub is_dir: bool,
}

impl TreeEntry {
    pub fn dir(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: None,
            is_dir: true,
        }
    }

    pub fn file(path: impl Into<String>, content: Option<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content,
            is_dir: false,
        }
    }
}

/// Client able to open repositories by full name (`owner/name`).
pub trait SourceTreeClient: Send + Sync {
    type Tree: TreeHandle;

    fn get_repo(
        &self,
        full_name: &str,
    ) -> impl std::future::Future<Output = Result<Self::Tree, SourceTreeError>> + Send;
}

/// An opened repository tree.
pub trait TreeHandle: Send + Sync {
    /// List a directory, or return the single entry for a file path.
    fn get_contents(
        &self,
        path: &str,
    ) -> impl std::future::Future<Output = Result<Vec<TreeEntry>, SourceTreeError>> + Send;
}
