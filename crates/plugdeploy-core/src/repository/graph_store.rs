//! Graph store trait definition.

use plugdeploy_types::error::GraphStoreError;

/// Trait for the shared graph database.
pub trait GraphStore: Send + Sync {
    /// Apply a schema document as one atomic alter operation.
    ///
    /// The store either accepts the whole document or rejects it; a rejected
    /// alter leaves the existing schema untouched.
    fn alter(
        &self,
        schema: &str,
    ) -> impl std::future::Future<Output = Result<(), GraphStoreError>> + Send;
}
