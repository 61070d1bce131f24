//! Infrastructure adapters for the plugdeploy ports.
//!
//! Each module implements a trait from `plugdeploy-core::repository`:
//! filesystem and in-memory object stores, the Dgraph HTTP client, GitHub
//! and local-directory source trees, environment secrets, and the session
//! token gate. Webhook signature checks and config loading live here too.

pub mod auth;
pub mod config;
pub mod graph;
pub mod secret;
pub mod source;
pub mod storage;
