//! Deployer configuration types.
//!
//! `DeployerConfig` represents `config.toml`. Every field has a default so an
//! empty file (or no file) yields a runnable local setup.

use serde::{Deserialize, Serialize};

/// Suffix appended to the bucket prefix to name the plugin bucket.
pub const PLUGIN_BUCKET_SUFFIX: &str = "-model-plugins-bucket";

/// Top-level configuration, loaded once at process start.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeployerConfig {
    /// Local mode: authentication disabled, random JWT secret.
    #[serde(default)]
    pub local: bool,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub graph: GraphConfig,

    #[serde(default)]
    pub webhook: WebhookSettings,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub walker: WalkerConfig,

    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

impl DeployerConfig {
    /// Name of the bucket holding plugin artifacts for this environment.
    pub fn plugin_bucket(&self) -> String {
        format!("{}{}", self.storage.bucket_prefix, PLUGIN_BUCKET_SUFFIX)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origin allowed by CORS. `None` mirrors the request origin.
    #[serde(default)]
    pub allowed_origin: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8123
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origin: None,
        }
    }
}

/// Where plugin buckets live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Filesystem,
    /// Process-local; contents are lost on exit.
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Deployment environment namespace for the bucket name.
    #[serde(default = "default_bucket_prefix")]
    pub bucket_prefix: String,
    /// Root directory of the filesystem object store. Defaults to
    /// `<data_dir>/buckets` when unset.
    #[serde(default)]
    pub root: Option<String>,
}

fn default_bucket_prefix() -> String {
    "local".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            bucket_prefix: default_bucket_prefix(),
            root: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Base URL of the Dgraph alpha HTTP endpoint.
    #[serde(default = "default_graph_endpoint")]
    pub endpoint: String,
}

fn default_graph_endpoint() -> String {
    "http://localhost:8080".to_string()
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            endpoint: default_graph_endpoint(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookSettings {
    /// Branch used when a push event does not report its default branch.
    #[serde(default = "default_branch")]
    pub default_branch: String,
    /// Repository directory whose children are plugin folders.
    #[serde(default = "default_plugin_root")]
    pub plugin_root: String,
    #[serde(default = "default_github_api")]
    pub api_base: String,
    /// Secret id of the shared webhook signing secret.
    #[serde(default = "default_shared_secret_id")]
    pub shared_secret_id: String,
    /// Secret id of the repository access token.
    #[serde(default = "default_access_token_id")]
    pub access_token_id: String,
}

fn default_branch() -> String {
    "master".to_string()
}

fn default_plugin_root() -> String {
    "model_plugins".to_string()
}

fn default_github_api() -> String {
    "https://api.github.com".to_string()
}

fn default_shared_secret_id() -> String {
    "GITHUB_SHARED_SECRET".to_string()
}

fn default_access_token_id() -> String {
    "GITHUB_ACCESS_TOKEN".to_string()
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            default_branch: default_branch(),
            plugin_root: default_plugin_root(),
            api_base: default_github_api(),
            shared_secret_id: default_shared_secret_id(),
            access_token_id: default_access_token_id(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret id of the HS256 signing key for session tokens.
    #[serde(default = "default_jwt_secret_id")]
    pub jwt_secret_id: String,
    /// Cookie carrying the session token.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
}

fn default_jwt_secret_id() -> String {
    "JWT_SECRET".to_string()
}

fn default_cookie_name() -> String {
    "grapl_jwt".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret_id: default_jwt_secret_id(),
            cookie_name: default_cookie_name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkerConfig {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_max_depth() -> usize {
    16
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

/// Per-collaborator call timeouts, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_graph_alter_secs")]
    pub graph_alter_secs: u64,
    #[serde(default = "default_object_store_secs")]
    pub object_store_secs: u64,
    #[serde(default = "default_source_tree_secs")]
    pub source_tree_secs: u64,
    #[serde(default = "default_evaluation_secs")]
    pub evaluation_secs: u64,
}

fn default_graph_alter_secs() -> u64 {
    60
}

fn default_object_store_secs() -> u64 {
    30
}

fn default_source_tree_secs() -> u64 {
    30
}

fn default_evaluation_secs() -> u64 {
    10
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            graph_alter_secs: default_graph_alter_secs(),
            object_store_secs: default_object_store_secs(),
            source_tree_secs: default_source_tree_secs(),
            evaluation_secs: default_evaluation_secs(),
        }
    }
}
