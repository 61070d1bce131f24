//! Secret resolution.
//!
//! - `env`: environment variable store
//! - [`resolve_secrets`]: reads every secret the deployer needs, once, at start

pub mod env;

use plugdeploy_core::repository::secret::SecretStore;
use plugdeploy_types::config::DeployerConfig;
use plugdeploy_types::error::SecretError;

/// Secrets resolved at process start and shared read-only afterwards.
#[derive(Clone)]
pub struct ResolvedSecrets {
    /// HS256 key for session tokens.
    pub jwt_secret: String,
    /// Webhook signing secret. `None` only in local mode.
    pub webhook_secret: Option<String>,
    /// Source-control access token. Optional: public repositories need none.
    pub access_token: Option<String>,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field("jwt_secret", &"<redacted>")
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "<redacted>"))
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Random per-process signing key for local mode.
pub fn generate_local_secret() -> String {
    format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    )
}

/// Resolve the configured secret ids through `store`.
///
/// Outside local mode the JWT secret and the webhook secret are required.
/// In local mode the JWT secret is random and the webhook secret optional.
pub async fn resolve_secrets<S: SecretStore>(
    store: &S,
    config: &DeployerConfig,
) -> Result<ResolvedSecrets, SecretError> {
    let access_token = store.get(&config.webhook.access_token_id).await?;
    let webhook_secret = store.get(&config.webhook.shared_secret_id).await?;

    if config.local {
        tracing::info!("local mode: using a random session signing key");
        return Ok(ResolvedSecrets {
            jwt_secret: generate_local_secret(),
            webhook_secret,
            access_token,
        });
    }

    let jwt_secret = store
        .get(&config.auth.jwt_secret_id)
        .await?
        .ok_or_else(|| SecretError::NotFound(config.auth.jwt_secret_id.clone()))?;
    let webhook_secret =
        webhook_secret.ok_or_else(|| SecretError::NotFound(config.webhook.shared_secret_id.clone()))?;

    if access_token.is_none() {
        tracing::warn!(
            id = %config.webhook.access_token_id,
            "no source-control access token, only public repositories can be read"
        );
    }

    Ok(ResolvedSecrets {
        jwt_secret,
        webhook_secret: Some(webhook_secret),
        access_token,
    })
}
