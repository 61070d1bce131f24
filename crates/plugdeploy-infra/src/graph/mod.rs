//! Graph store adapters.

pub mod dgraph;

pub use dgraph::DgraphClient;
