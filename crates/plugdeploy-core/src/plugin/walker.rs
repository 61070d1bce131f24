//! Repository walker.
//!
//! Iterative depth-first traversal of a source tree. Every directory is
//! listed exactly once, every path is visited at most once (explicit visited
//! set), and depth is bounded. The walk is a lazy, non-restartable stream:
//! nothing is listed until the stream is polled.

use std::collections::HashSet;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use thiserror::Error;

use plugdeploy_types::error::SourceTreeError;

use crate::repository::source_tree::{TreeEntry, TreeHandle};

/// Errors that end a walk.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("source tree error: {0}")]
    Source(#[from] SourceTreeError),

    #[error("path '{path}' exceeds maximum walk depth {max_depth}")]
    DepthExceeded { path: String, max_depth: usize },

    #[error("file '{0}' has no content")]
    MissingContent(String),

    #[error("listing '{0}' timed out")]
    Timeout(String),
}

/// A node visited during a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    pub path: String,
    pub depth: usize,
    pub kind: WalkEntryKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkEntryKind {
    Directory,
    File { contents: Vec<u8> },
}

impl WalkEntry {
    pub fn is_dir(&self) -> bool {
        matches!(self.kind, WalkEntryKind::Directory)
    }
}

/// Walks a [`TreeHandle`] from a root directory.
#[derive(Debug, Clone, Copy)]
pub struct RepositoryWalker {
    max_depth: usize,
    call_timeout: Duration,
}

impl RepositoryWalker {
    /// `max_depth` counts edges from the root; the root itself is depth 0.
    pub fn new(max_depth: usize, call_timeout: Duration) -> Self {
        Self {
            max_depth,
            call_timeout,
        }
    }

    /// Lazily walk `tree` starting at the directory `root`.
    ///
    /// Yields the root, then every reachable directory and file in
    /// depth-first pre-order. The stream ends after the first error.
    pub fn walk<'a, T: TreeHandle>(
        &self,
        tree: &'a T,
        root: &str,
    ) -> impl Stream<Item = Result<WalkEntry, WalkError>> + Send + use<'a, T> {
        let max_depth = self.max_depth;
        let call_timeout = self.call_timeout;
        let root = root.to_string();

        async_stream::try_stream! {
            let mut visited: HashSet<String> = HashSet::new();
            visited.insert(root.clone());
            let mut stack: Vec<(TreeEntry, usize)> = vec![(TreeEntry::dir(root), 0)];

            while let Some((entry, depth)) = stack.pop() {
                if !entry.is_dir {
                    let contents = match entry.content {
                        Some(contents) => contents,
                        None => fetch_file(tree, &entry.path, call_timeout).await?,
                    };
                    yield WalkEntry {
                        path: entry.path,
                        depth,
                        kind: WalkEntryKind::File { contents },
                    };
                    continue;
                }

                let children = list(tree, &entry.path, call_timeout).await?;
                tracing::trace!(path = %entry.path, children = children.len(), "listed tree node");

                // Push in reverse so children pop in listing order.
                for child in children.into_iter().rev() {
                    if child.path == entry.path || !visited.insert(child.path.clone()) {
                        tracing::debug!(path = %child.path, "skipping already visited tree path");
                        continue;
                    }
                    if depth + 1 > max_depth {
                        Err::<(), _>(WalkError::DepthExceeded { path: child.path.clone(), max_depth })?;
                    } else {
                        stack.push((child, depth + 1));
                    }
                }

                yield WalkEntry {
                    path: entry.path,
                    depth,
                    kind: WalkEntryKind::Directory,
                };
            }
        }
    }

    /// Drive a walk to completion, calling `visitor` once per visited node.
    pub async fn walk_with<T, F>(&self, tree: &T, root: &str, mut visitor: F) -> Result<(), WalkError>
    where
        T: TreeHandle,
        F: FnMut(&WalkEntry),
    {
        let stream = self.walk(tree, root);
        futures_util::pin_mut!(stream);
        while let Some(entry) = stream.next().await {
            visitor(&entry?);
        }
        Ok(())
    }

    /// Collect every file under `root` as `(path, contents)`, in walk order.
    pub async fn collect_files<T: TreeHandle>(
        &self,
        tree: &T,
        root: &str,
    ) -> Result<Vec<(String, Vec<u8>)>, WalkError> {
        let stream = self.walk(tree, root);
        futures_util::pin_mut!(stream);
        let mut files = Vec::new();
        while let Some(entry) = stream.next().await {
            let entry = entry?;
            if let WalkEntryKind::File { contents } = entry.kind {
                files.push((entry.path, contents));
            }
        }
        Ok(files)
    }
}

async fn list<T: TreeHandle>(
    tree: &T,
    path: &str,
    call_timeout: Duration,
) -> Result<Vec<TreeEntry>, WalkError> {
    match tokio::time::timeout(call_timeout, tree.get_contents(path)).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(WalkError::Timeout(path.to_string())),
    }
}

async fn fetch_file<T: TreeHandle>(
    tree: &T,
    path: &str,
    call_timeout: Duration,
) -> Result<Vec<u8>, WalkError> {
    list(tree, path, call_timeout)
        .await?
        .into_iter()
        .find(|e| e.path == path && !e.is_dir)
        .and_then(|e| e.content)
        .ok_or_else(|| WalkError::MissingContent(path.to_string()))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// In-memory tree recording every path it was asked to list.
    #[derive(Default)]
    struct FakeTree {
        listings: HashMap<String, Vec<TreeEntry>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeTree {
        fn with(mut self, path: &str, entries: Vec<TreeEntry>) -> Self {
            self.listings.insert(path.to_string(), entries);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl TreeHandle for FakeTree {
        async fn get_contents(&self, path: &str) -> Result<Vec<TreeEntry>, SourceTreeError> {
            self.calls.lock().unwrap().push(path.to_string());
            self.listings
                .get(path)
                .cloned()
                .ok_or_else(|| SourceTreeError::NotFound(path.to_string()))
        }
    }

    fn walker() -> RepositoryWalker {
        RepositoryWalker::new(8, Duration::from_secs(5))
    }

    fn sample_tree() -> FakeTree {
        FakeTree::default()
            .with(
                "root",
                vec![TreeEntry::dir("root/alpha"), TreeEntry::dir("root/beta")],
            )
            .with(
                "root/alpha",
                vec![
                    TreeEntry::file("root/alpha/schema.py", Some(b"nodes: []".to_vec())),
                    TreeEntry::dir("root/alpha/lib"),
                ],
            )
            .with(
                "root/alpha/lib",
                vec![TreeEntry::file("root/alpha/lib/util.py", Some(b"x = 1".to_vec()))],
            )
            .with(
                "root/beta",
                vec![TreeEntry::file("root/beta/plugin.py", None)],
            )
            .with(
                "root/beta/plugin.py",
                vec![TreeEntry::file("root/beta/plugin.py", Some(b"y = 2".to_vec()))],
            )
    }

    #[tokio::test]
    async fn test_visits_directories_and_files_once() {
        let tree = sample_tree();
        let mut visited = Vec::new();
        walker()
            .walk_with(&tree, "root", |e| visited.push((e.path.clone(), e.is_dir())))
            .await
            .unwrap();

        assert_eq!(
            visited,
            vec![
                ("root".to_string(), true),
                ("root/alpha".to_string(), true),
                ("root/alpha/schema.py".to_string(), false),
                ("root/alpha/lib".to_string(), true),
                ("root/alpha/lib/util.py".to_string(), false),
                ("root/beta".to_string(), true),
                ("root/beta/plugin.py".to_string(), false),
            ]
        );
    }

    #[tokio::test]
    async fn test_lists_each_directory_once_and_fetches_only_missing_content() {
        let tree = sample_tree();
        walker().collect_files(&tree, "root").await.unwrap();

        let mut calls = tree.calls();
        calls.sort();
        assert_eq!(
            calls,
            vec!["root", "root/alpha", "root/alpha/lib", "root/beta", "root/beta/plugin.py"]
        );
    }

    #[tokio::test]
    async fn test_collect_files_returns_contents() {
        let tree = sample_tree();
        let files = walker().collect_files(&tree, "root").await.unwrap();

        assert_eq!(files.len(), 3);
        assert_eq!(files[0], ("root/alpha/schema.py".to_string(), b"nodes: []".to_vec()));
        assert_eq!(files[2], ("root/beta/plugin.py".to_string(), b"y = 2".to_vec()));
    }

    #[tokio::test]
    async fn test_cyclic_listing_terminates() {
        // "a" lists "a/b", which lists its parent and itself again.
        let tree = FakeTree::default()
            .with("a", vec![TreeEntry::dir("a/b")])
            .with("a/b", vec![TreeEntry::dir("a"), TreeEntry::dir("a/b")]);

        let mut visited = Vec::new();
        walker()
            .walk_with(&tree, "a", |e| visited.push(e.path.clone()))
            .await
            .unwrap();

        assert_eq!(visited, vec!["a", "a/b"]);
    }

    #[tokio::test]
    async fn test_depth_bound_is_an_error() {
        let tree = FakeTree::default()
            .with("r", vec![TreeEntry::dir("r/1")])
            .with("r/1", vec![TreeEntry::dir("r/1/2")])
            .with("r/1/2", vec![TreeEntry::dir("r/1/2/3")])
            .with("r/1/2/3", vec![]);

        let shallow = RepositoryWalker::new(2, Duration::from_secs(5));
        let err = shallow.collect_files(&tree, "r").await.unwrap_err();
        assert!(matches!(err, WalkError::DepthExceeded { max_depth: 2, .. }));

        let deep = RepositoryWalker::new(3, Duration::from_secs(5));
        assert!(deep.collect_files(&tree, "r").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_root_is_a_source_error() {
        let tree = FakeTree::default();
        let err = walker().collect_files(&tree, "nope").await.unwrap_err();
        assert!(matches!(err, WalkError::Source(SourceTreeError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_file_without_fetchable_content() {
        let tree = FakeTree::default()
            .with("r", vec![TreeEntry::file("r/empty.py", None)])
            .with("r/empty.py", vec![TreeEntry::file("r/empty.py", None)]);

        let err = walker().collect_files(&tree, "r").await.unwrap_err();
        assert!(matches!(err, WalkError::MissingContent(p) if p == "r/empty.py"));
    }

    #[tokio::test]
    async fn test_walk_is_lazy() {
        let tree = sample_tree();
        let stream = walker().walk(&tree, "root");
        assert!(tree.calls().is_empty());
        drop(stream);
        assert!(tree.calls().is_empty());
    }
}
