//! Plugin bundles: tree walking, ingestion, and artifact storage.

pub mod ingest;
pub mod store;
pub mod walker;
