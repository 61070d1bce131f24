//! Collaborator traits ("ports") implemented in plugdeploy-infra.

pub mod auth;
pub mod graph_store;
pub mod object_store;
pub mod secret;
pub mod source_tree;
