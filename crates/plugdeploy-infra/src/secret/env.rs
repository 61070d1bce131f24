//! Environment variable secret store.
//!
//! Secret ids are environment variable names (e.g. `JWT_SECRET`).

use plugdeploy_core::repository::secret::SecretStore;
use plugdeploy_types::error::SecretError;

/// Read-only secret store backed by the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSecretStore;

impl EnvSecretStore {
    pub fn new() -> Self {
        Self
    }
}

impl SecretStore for EnvSecretStore {
    async fn get(&self, id: &str) -> Result<Option<String>, SecretError> {
        match std::env::var(id) {
            Ok(val) if val.is_empty() => Ok(None),
            Ok(val) => Ok(Some(val)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            // Secrets must be valid strings; treat non-Unicode as absent.
            Err(std::env::VarError::NotUnicode(_)) => Ok(None),
        }
    }
}
