//! Secret store trait definition.

use plugdeploy_types::error::SecretError;

/// Trait for secret backends. Secrets are resolved once at process start.
pub trait SecretStore: Send + Sync {
    /// Retrieve a secret by id. Returns None if this backend does not hold it.
    fn get(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>, SecretError>> + Send;
}
