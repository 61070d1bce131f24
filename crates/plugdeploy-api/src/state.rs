//! Application state wiring all services together.
//!
//! The services are generic over the core ports; this module pins them to
//! the concrete infra adapters. Secrets and configuration are resolved once
//! here and never mutated afterwards.

use std::sync::Arc;
use std::time::Duration;

use plugdeploy_core::plugin::store::PluginStore;
use plugdeploy_core::plugin::walker::RepositoryWalker;
use plugdeploy_core::repository::auth::{AllowAll, AuthGate};
use plugdeploy_core::schema::builder::SchemaProvisioner;
use plugdeploy_core::service::deploy::DeploymentService;
use plugdeploy_core::service::webhook::WebhookService;
use plugdeploy_infra::auth::jwt::JwtAuthGate;
use plugdeploy_infra::config::storage_root;
use plugdeploy_infra::graph::DgraphClient;
use plugdeploy_infra::secret::env::EnvSecretStore;
use plugdeploy_infra::secret::{ResolvedSecrets, resolve_secrets};
use plugdeploy_infra::source::github::GitHubClient;
use plugdeploy_infra::storage::BucketStore;
use plugdeploy_types::config::DeployerConfig;
use plugdeploy_types::schema::BuiltinNodeSet;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteDeploymentService = DeploymentService<BucketStore, DgraphClient>;

pub type ConcreteWebhookService = WebhookService<GitHubClient>;

/// Build the deployment pipeline for `config`. Needs no secrets.
pub fn build_deployer(config: &DeployerConfig) -> ConcreteDeploymentService {
    let store = BucketStore::from_backend(config.storage.backend, storage_root(config));
    build_deployer_with(config, store)
}

pub fn build_deployer_with(config: &DeployerConfig, store: BucketStore) -> ConcreteDeploymentService {
    let timeouts = &config.timeouts;
    DeploymentService::new(
        PluginStore::new(
            store,
            config.plugin_bucket(),
            Duration::from_secs(timeouts.object_store_secs),
        ),
        SchemaProvisioner::new(
            DgraphClient::new(&config.graph.endpoint),
            BuiltinNodeSet::default(),
            Duration::from_secs(timeouts.graph_alter_secs),
        ),
        Duration::from_secs(timeouts.evaluation_secs),
    )
}

pub fn build_walker(config: &DeployerConfig) -> RepositoryWalker {
    RepositoryWalker::new(
        config.walker.max_depth,
        Duration::from_secs(config.timeouts.source_tree_secs),
    )
}

/// Shared state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    pub deployer: Arc<ConcreteDeploymentService>,
    pub webhooks: Arc<ConcreteWebhookService>,
    pub auth: Arc<dyn AuthGate>,
    /// Webhook signing secret. `None` only in local mode.
    pub webhook_secret: Option<Arc<str>>,
    pub config: Arc<DeployerConfig>,
}

impl AppState {
    /// Resolve secrets from the environment and wire every service.
    pub async fn init(config: DeployerConfig) -> anyhow::Result<Self> {
        let secrets = resolve_secrets(&EnvSecretStore::new(), &config).await?;
        Ok(Self::from_parts(config, secrets, None))
    }

    /// Wire services from already-resolved parts. `store` overrides the
    /// configured object store backend.
    pub fn from_parts(
        config: DeployerConfig,
        secrets: ResolvedSecrets,
        store: Option<BucketStore>,
    ) -> Self {
        let deployer = match store {
            Some(store) => build_deployer_with(&config, store),
            None => build_deployer(&config),
        };

        let webhooks = WebhookService::new(
            GitHubClient::new(&config.webhook.api_base, secrets.access_token.clone()),
            build_walker(&config),
            config.webhook.default_branch.clone(),
            config.webhook.plugin_root.clone(),
            Duration::from_secs(config.timeouts.source_tree_secs),
        );

        let auth: Arc<dyn AuthGate> = if config.local {
            tracing::warn!("local mode: authentication is disabled");
            Arc::new(AllowAll)
        } else {
            Arc::new(JwtAuthGate::new(&secrets.jwt_secret))
        };

        Self {
            deployer: Arc::new(deployer),
            webhooks: Arc::new(webhooks),
            auth,
            webhook_secret: secrets.webhook_secret.map(Arc::from),
            config: Arc::new(config),
        }
    }
}
