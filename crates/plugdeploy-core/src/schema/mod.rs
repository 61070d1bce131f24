//! Schema materialization and provisioning.

pub mod builder;
pub mod evaluator;
