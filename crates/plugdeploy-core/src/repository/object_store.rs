//! Object store trait definition.

use plugdeploy_types::error::StoreError;

/// Trait for flat-namespace object storage (buckets of keyed blobs).
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
/// Implementations live in plugdeploy-infra.
pub trait ObjectStore: Send + Sync {
    /// Store `body` under `key`, replacing any existing object.
    fn put(
        &self,
        bucket: &str,
        key: &str,
        body: &[u8],
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Retrieve an object's content.
    fn get(
        &self,
        bucket: &str,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, StoreError>> + Send;

    /// List every key in the bucket, optionally restricted to a key prefix.
    fn list(
        &self,
        bucket: &str,
        prefix: Option<&str>,
    ) -> impl std::future::Future<Output = Result<Vec<String>, StoreError>> + Send;

    /// Delete an object. Deleting a missing key is not an error.
    fn delete(
        &self,
        bucket: &str,
        key: &str,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}
