//! Plugin ingestion and schema provisioning pipeline.
//!
//! This crate defines the "ports" (collaborator traits) that the
//! infrastructure layer implements, and the pipeline built on top of them:
//! the repository walker, the ingestor, the schema evaluator and builder,
//! the plugin store, and the deployment and webhook services. It depends
//! only on `plugdeploy-types` -- never on `plugdeploy-infra`.

pub mod plugin;
pub mod repository;
pub mod schema;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;
