use thiserror::Error;

/// Deployment-level failures, ordered by how early they can occur.
///
/// `Validation` happens before any side effect. `Evaluation` and
/// `SchemaApply` abort a deployment before any artifact is uploaded.
/// `Storage` is reported after every artifact has been attempted.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("schema source '{path}' failed to evaluate: {message}")]
    Evaluation { path: String, message: String },

    #[error("graph store rejected schema: {0}")]
    SchemaApply(String),

    #[error("failed to store {} artifact(s): {}", .failed.len(), .failed.join(", "))]
    Storage { failed: Vec<String> },

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl DeployError {
    /// Whether the message is safe to surface to the caller verbatim.
    pub fn is_user_visible(&self) -> bool {
        matches!(self, DeployError::Validation(_) | DeployError::Storage { .. })
    }
}

/// Errors from object store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("object store backend error: {0}")]
    Backend(String),

    #[error("object store call timed out: {0}")]
    Timeout(String),
}

/// Errors from the graph store client.
#[derive(Debug, Error)]
pub enum GraphStoreError {
    /// The store refused the schema; nothing was applied.
    #[error("schema rejected: {0}")]
    Rejected(String),

    #[error("graph store transport error: {0}")]
    Transport(String),
}

/// Errors from the source-control tree client.
#[derive(Debug, Error)]
pub enum SourceTreeError {
    #[error("path not found in source tree: {0}")]
    NotFound(String),

    #[error("source tree transport error: {0}")]
    Transport(String),

    #[error("could not decode content of '{path}': {message}")]
    Decode { path: String, message: String },
}

/// Errors from secret retrieval.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("secret not found: {0}")]
    NotFound(String),
}

/// Credential verification failures.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing credential")]
    MissingCredential,

    #[error("malformed credential: {0}")]
    Malformed(String),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("credential expired")]
    Expired,
}
