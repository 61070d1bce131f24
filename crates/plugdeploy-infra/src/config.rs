//! Configuration loader for plugdeploy.
//!
//! Reads `config.toml` (from `--config` or the data directory,
//! `~/.plugdeploy/` in production) into [`DeployerConfig`], falling back to
//! defaults when the file is missing or malformed, then applies
//! `PLUGDEPLOY_*` environment overrides.

use std::path::{Path, PathBuf};

use plugdeploy_types::config::DeployerConfig;

pub const ENV_BUCKET_PREFIX: &str = "PLUGDEPLOY_BUCKET_PREFIX";
pub const ENV_LOCAL: &str = "PLUGDEPLOY_LOCAL";
pub const ENV_GRAPH_ENDPOINT: &str = "PLUGDEPLOY_GRAPH_ENDPOINT";
pub const ENV_STORAGE_ROOT: &str = "PLUGDEPLOY_STORAGE_ROOT";

/// Default data directory: `~/.plugdeploy`.
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".plugdeploy")
}

/// Load configuration from `path`, or `{data_dir}/config.toml` when `None`.
///
/// - Missing file: defaults.
/// - Unreadable or unparsable file: logs a warning and returns defaults.
///
/// Environment overrides are applied in every case.
pub async fn load_config(path: Option<&Path>) -> DeployerConfig {
    let config_path = match path {
        Some(p) => p.to_path_buf(),
        None => data_dir().join("config.toml"),
    };
    let config = read_config_file(&config_path).await;
    apply_env_overrides(config, |key| std::env::var(key).ok())
}

async fn read_config_file(config_path: &Path) -> DeployerConfig {
    let content = match tokio::fs::read_to_string(config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", config_path.display());
            return DeployerConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return DeployerConfig::default();
        }
    };

    match toml::from_str::<DeployerConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            DeployerConfig::default()
        }
    }
}

/// Apply `PLUGDEPLOY_*` overrides read through `lookup`.
pub fn apply_env_overrides<F>(mut config: DeployerConfig, lookup: F) -> DeployerConfig
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(prefix) = lookup(ENV_BUCKET_PREFIX).filter(|v| !v.is_empty()) {
        config.storage.bucket_prefix = prefix;
    }
    if let Some(local) = lookup(ENV_LOCAL) {
        config.local = matches!(local.trim().to_lowercase().as_str(), "1" | "true" | "yes");
    }
    if let Some(endpoint) = lookup(ENV_GRAPH_ENDPOINT).filter(|v| !v.is_empty()) {
        config.graph.endpoint = endpoint;
    }
    if let Some(root) = lookup(ENV_STORAGE_ROOT).filter(|v| !v.is_empty()) {
        config.storage.root = Some(root);
    }
    config
}

/// Directory holding the filesystem buckets.
pub fn storage_root(config: &DeployerConfig) -> PathBuf {
    config
        .storage
        .root
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| data_dir().join("buckets"))
}
