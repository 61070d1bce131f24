//! Shared domain types for the model plugin deployer.
//!
//! This crate contains the domain types used across the deployer: plugin
//! files and artifact keys, schema definitions and their declarative
//! description, push events, configuration, and the error taxonomy.
//!
//! Zero infrastructure dependencies -- only serde, base64, thiserror.

pub mod config;
pub mod error;
pub mod plugin;
pub mod schema;
pub mod webhook;
