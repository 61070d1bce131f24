//! GitHub contents API client.
//!
//! `GET /repos/{owner}/{repo}/contents/{path}` returns an array for a
//! directory and an object with base64 `content` for a file.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;

use plugdeploy_core::repository::source_tree::{SourceTreeClient, TreeEntry, TreeHandle};
use plugdeploy_types::error::SourceTreeError;

const GITHUB_ACCEPT: &str = "application/vnd.github+json";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    Listing(Vec<ContentItem>),
    Single(ContentItem),
}

#[derive(Debug, Deserialize)]
struct ContentItem {
    path: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

impl ContentItem {
    fn into_entry(self) -> Result<Option<TreeEntry>, SourceTreeError> {
        match self.kind.as_str() {
            "dir" => Ok(Some(TreeEntry::dir(self.path))),
            "file" => {
                let content = match (self.content, self.encoding.as_deref()) {
                    (Some(encoded), Some("base64")) => Some(decode_content(&self.path, &encoded)?),
                    (Some(raw), None) if !raw.is_empty() => Some(raw.into_bytes()),
                    _ => None,
                };
                Ok(Some(TreeEntry::file(self.path, content)))
            }
            other => {
                tracing::debug!(path = %self.path, kind = other, "skipping unsupported tree entry");
                Ok(None)
            }
        }
    }
}

/// Decode GitHub's line-wrapped base64.
fn decode_content(path: &str, encoded: &str) -> Result<Vec<u8>, SourceTreeError> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| SourceTreeError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
}

fn parse_contents(body: &str) -> Result<Vec<TreeEntry>, SourceTreeError> {
    let response: ContentsResponse =
        serde_json::from_str(body).map_err(|e| SourceTreeError::Transport(format!(
            "unexpected contents response: {e}"
        )))?;
    let items = match response {
        ContentsResponse::Listing(items) => items,
        ContentsResponse::Single(item) => vec![item],
    };

    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        if let Some(entry) = item.into_entry()? {
            entries.push(entry);
        }
    }
    Ok(entries)
}

#[derive(Debug, Clone)]
struct GitHubHttp {
    http: reqwest::Client,
    token: Option<String>,
}

impl GitHubHttp {
    async fn get(&self, url: &str) -> Result<String, SourceTreeError> {
        let mut request = self.http.get(url).header("accept", GITHUB_ACCEPT);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SourceTreeError::Transport(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        match status.as_u16() {
            200..=299 => Ok(body),
            404 => Err(SourceTreeError::NotFound(url.to_string())),
            _ => Err(SourceTreeError::Transport(format!("HTTP {status}: {body}"))),
        }
    }
}

/// [`SourceTreeClient`] for GitHub repositories.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    inner: GitHubHttp,
    api_base: String,
}

impl GitHubClient {
    pub fn new(api_base: impl Into<String>, token: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("plugdeploy/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self {
            inner: GitHubHttp { http, token },
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }
}

impl SourceTreeClient for GitHubClient {
    type Tree = GitHubTree;

    async fn get_repo(&self, full_name: &str) -> Result<GitHubTree, SourceTreeError> {
        let repo_url = format!("{}/repos/{}", self.api_base, full_name);
        self.inner.get(&repo_url).await.map_err(|e| match e {
            SourceTreeError::NotFound(_) => SourceTreeError::NotFound(full_name.to_string()),
            other => other,
        })?;
        tracing::debug!(repository = full_name, "opened repository");

        Ok(GitHubTree {
            inner: self.inner.clone(),
            contents_url: format!("{repo_url}/contents"),
        })
    }
}

/// One opened GitHub repository.
#[derive(Debug, Clone)]
pub struct GitHubTree {
    inner: GitHubHttp,
    contents_url: String,
}

impl GitHubTree {
    fn url_for(&self, path: &str) -> String {
        let path = path.trim_matches('/');
        if path.is_empty() {
            self.contents_url.clone()
        } else {
            format!("{}/{}", self.contents_url, path)
        }
    }
}

impl TreeHandle for GitHubTree {
    async fn get_contents(&self, path: &str) -> Result<Vec<TreeEntry>, SourceTreeError> {
        let body = self
            .inner
            .get(&self.url_for(path))
            .await
            .map_err(|e| match e {
                SourceTreeError::NotFound(_) => SourceTreeError::NotFound(path.to_string()),
                other => other,
            })?;
        parse_contents(&body)
    }
}
