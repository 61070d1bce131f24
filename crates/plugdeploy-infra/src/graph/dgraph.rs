//! Dgraph HTTP client.
//!
//! Schema changes go to `POST {endpoint}/alter` with the schema document as
//! the body. Dgraph reports schema errors either with a non-2xx status or
//! with an `errors` array in a 200 response; both mean nothing was applied.

use serde::Deserialize;

use plugdeploy_core::repository::graph_store::GraphStore;
use plugdeploy_types::error::GraphStoreError;

#[derive(Debug, Deserialize)]
struct AlterResponse {
    #[serde(default)]
    errors: Vec<AlterErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct AlterErrorEntry {
    message: String,
}

/// [`GraphStore`] over Dgraph's HTTP API.
#[derive(Debug, Clone)]
pub struct DgraphClient {
    http: reqwest::Client,
    endpoint: String,
}

impl DgraphClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("plugdeploy/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    fn alter_url(&self) -> String {
        format!("{}/alter", self.endpoint)
    }
}

/// Interpret an `/alter` response body. `Ok` means the schema was applied.
fn parse_alter_response(status: reqwest::StatusCode, body: &str) -> Result<(), GraphStoreError> {
    let parsed: Option<AlterResponse> = serde_json::from_str(body).ok();
    let messages: Vec<String> = parsed
        .map(|r| r.errors.into_iter().map(|e| e.message).collect())
        .unwrap_or_default();

    if !messages.is_empty() {
        return Err(GraphStoreError::Rejected(messages.join("; ")));
    }
    if status.is_server_error() {
        return Err(GraphStoreError::Transport(format!("HTTP {status}: {body}")));
    }
    if !status.is_success() {
        return Err(GraphStoreError::Rejected(format!("HTTP {status}: {body}")));
    }
    Ok(())
}

impl GraphStore for DgraphClient {
    async fn alter(&self, schema: &str) -> Result<(), GraphStoreError> {
        let url = self.alter_url();
        tracing::debug!(url = %url, bytes = schema.len(), "sending schema alter");

        let response = self
            .http
            .post(&url)
            .header("content-type", "application/rdf")
            .body(schema.to_string())
            .send()
            .await
            .map_err(|e| GraphStoreError::Transport(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        parse_alter_response(status, &body)
    }
}
