//! Local directory source tree.
//!
//! Paths are relative to the base directory with `/` separators; the empty
//! path is the base directory itself. File contents are read on demand.

use std::path::{Component, Path, PathBuf};

use plugdeploy_core::repository::source_tree::{TreeEntry, TreeHandle};
use plugdeploy_types::error::SourceTreeError;

#[derive(Debug, Clone)]
pub struct LocalSourceTree {
    base: PathBuf,
}

impl LocalSourceTree {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, SourceTreeError> {
        let relative = Path::new(path);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(SourceTreeError::NotFound(path.to_string()));
        }
        Ok(self.base.join(relative))
    }
}

fn child_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{name}", parent.trim_end_matches('/'))
    }
}

fn io_error(path: &str, err: std::io::Error) -> SourceTreeError {
    if err.kind() == std::io::ErrorKind::NotFound {
        SourceTreeError::NotFound(path.to_string())
    } else {
        SourceTreeError::Transport(format!("{path}: {err}"))
    }
}

impl TreeHandle for LocalSourceTree {
    async fn get_contents(&self, path: &str) -> Result<Vec<TreeEntry>, SourceTreeError> {
        let full = self.resolve(path)?;
        let metadata = tokio::fs::metadata(&full)
            .await
            .map_err(|e| io_error(path, e))?;

        if metadata.is_file() {
            let content = tokio::fs::read(&full).await.map_err(|e| io_error(path, e))?;
            return Ok(vec![TreeEntry::file(path, Some(content))]);
        }

        let mut reader = tokio::fs::read_dir(&full)
            .await
            .map_err(|e| io_error(path, e))?;
        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await.map_err(|e| io_error(path, e))? {
            let Ok(name) = entry.file_name().into_string() else {
                tracing::warn!(path = %entry.path().display(), "skipping non-UTF-8 file name");
                continue;
            };
            let child = child_path(path, &name);
            let child_meta = tokio::fs::metadata(entry.path())
                .await
                .map_err(|e| io_error(&child, e))?;
            if child_meta.is_dir() {
                entries.push(TreeEntry::dir(child));
            } else if child_meta.is_file() {
                entries.push(TreeEntry::file(child, None));
            }
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }
}
