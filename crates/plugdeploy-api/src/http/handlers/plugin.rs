//! Plugin deployment, listing and deletion handlers.

use std::collections::BTreeMap;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use plugdeploy_types::plugin::PluginFile;

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::response::Success;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DeployRequest {
    /// `<plugin_name>/<relative path>` to file contents.
    pub plugins: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub plugins_to_delete: Vec<String>,
}

/// Parse a JSON body into the envelope's error shape on failure.
pub(crate) fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("Invalid request body: {e}")))
}

/// POST /deploy
pub async fn deploy(
    State(state): State<AppState>,
    _auth: Authenticated,
    body: Bytes,
) -> Result<Success<Value>, AppError> {
    let start = Instant::now();
    let request: DeployRequest = parse_body(&body)?;
    let files = request
        .plugins
        .into_iter()
        .map(|(path, contents)| PluginFile::new(path, contents))
        .collect();

    let report = state.deployer.deploy(files).await?;
    tracing::info!(
        deployed_types = ?report.deployed_types,
        stored = report.stored_artifacts,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "deploy request complete"
    );
    Ok(Success(json!({ "Success": true })))
}

/// POST /listModelPlugins
pub async fn list_plugins(
    State(state): State<AppState>,
    _auth: Authenticated,
) -> Result<Success<Value>, AppError> {
    let plugin_list = state.deployer.list_plugins().await?;
    Ok(Success(json!({ "plugin_list": plugin_list })))
}

/// POST /deleteModelPlugin
pub async fn delete_plugins(
    State(state): State<AppState>,
    _auth: Authenticated,
    body: Bytes,
) -> Result<Success<Value>, AppError> {
    let request: DeleteRequest = parse_body(&body)?;
    let deleted = state
        .deployer
        .delete_plugins(&request.plugins_to_delete)
        .await?;
    tracing::info!(plugins = ?request.plugins_to_delete, deleted, "delete request complete");
    Ok(Success(json!({ "Success": "Deleted plugins" })))
}
