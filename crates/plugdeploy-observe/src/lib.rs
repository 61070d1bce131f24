//! Observability setup for plugdeploy.

pub mod tracing_setup;
