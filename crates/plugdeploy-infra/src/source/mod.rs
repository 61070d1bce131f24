//! Source tree adapters.
//!
//! - `github`: repositories read through the GitHub contents API
//! - `local`: a directory on disk, used by `plugdeploy deploy <dir>`

pub mod github;
pub mod local;
