//! Credential verification trait.

use plugdeploy_types::error::AuthError;

/// Decides whether a caller may use the authenticated operations.
pub trait AuthGate: Send + Sync {
    /// `Ok(())` allows the request; any error denies it.
    fn verify(&self, credential: Option<&str>) -> Result<(), AuthError>;
}

/// Gate that allows every request. Used in local mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AuthGate for AllowAll {
    fn verify(&self, _credential: Option<&str>) -> Result<(), AuthError> {
        Ok(())
    }
}
