//! Plugin files and the artifact key scheme.
//!
//! A plugin is the set of files sharing the first path segment. Stored
//! artifacts live under `<plugin_name>/<encode(relative_path)>` where
//! `encode` is URL-safe base64 without padding. The encoded segment never
//! contains `/`, so nested paths inside a plugin cannot be mistaken for extra
//! hierarchy in a flat-namespace bucket.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reserved name used to bootstrap plugin buckets. Never listed as a plugin.
pub const SENTINEL_PLUGIN_NAME: &str = "__init__.py";

/// File name suffixes that mark a plugin file as a schema source.
pub const SCHEMA_SOURCE_SUFFIXES: [&str; 2] = ["schema.py", "schemas.py"];

/// A single file of a submitted plugin bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginFile {
    /// Full path, `<plugin_name>/<relative_path>`.
    pub path: String,
    pub contents: Vec<u8>,
}

impl PluginFile {
    pub fn new(path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }

    /// Suffix match, case-sensitive.
    pub fn is_schema_source(&self) -> bool {
        is_schema_source_path(&self.path)
    }
}

/// Returns true when `path` ends in `schema.py` or `schemas.py`.
pub fn is_schema_source_path(path: &str) -> bool {
    SCHEMA_SOURCE_SUFFIXES
        .iter()
        .any(|suffix| path.ends_with(suffix))
}

/// Errors raised while mapping paths to and from artifact keys.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArtifactKeyError {
    #[error("path '{0}' has no plugin name")]
    MissingPluginName(String),

    #[error("path '{0}' has no file below the plugin directory")]
    MissingRelativePath(String),

    #[error("plugin name '{0}' is reserved")]
    ReservedName(String),

    #[error("plugin name '{0}' cannot be stored")]
    InvalidPluginName(String),

    #[error("stored key '{0}' is not a valid artifact key")]
    InvalidKey(String),
}

/// The storage identity of a plugin artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoredArtifactKey {
    pub plugin_name: String,
    pub relative_path: String,
}

impl StoredArtifactKey {
    /// Split a submitted path on its first `/`.
    pub fn parse(path: &str) -> Result<Self, ArtifactKeyError> {
        let (plugin_name, relative_path) = path
            .split_once('/')
            .ok_or_else(|| ArtifactKeyError::MissingRelativePath(path.to_string()))?;

        if plugin_name.is_empty() {
            return Err(ArtifactKeyError::MissingPluginName(path.to_string()));
        }
        if relative_path.is_empty() {
            return Err(ArtifactKeyError::MissingRelativePath(path.to_string()));
        }
        if plugin_name == SENTINEL_PLUGIN_NAME {
            return Err(ArtifactKeyError::ReservedName(plugin_name.to_string()));
        }
        if !is_storable_segment(plugin_name) {
            return Err(ArtifactKeyError::InvalidPluginName(plugin_name.to_string()));
        }

        Ok(Self {
            plugin_name: plugin_name.to_string(),
            relative_path: relative_path.to_string(),
        })
    }

    /// Object key: `<plugin_name>/<encoded relative path>`.
    pub fn to_key(&self) -> String {
        format!("{}/{}", self.plugin_name, encode_relative_path(&self.relative_path))
    }

    /// Inverse of [`StoredArtifactKey::to_key`].
    pub fn from_key(key: &str) -> Result<Self, ArtifactKeyError> {
        let invalid = || ArtifactKeyError::InvalidKey(key.to_string());

        let (plugin_name, encoded) = key.split_once('/').ok_or_else(invalid)?;
        if plugin_name.is_empty() || encoded.is_empty() || encoded.contains('/') {
            return Err(invalid());
        }
        let relative_path = decode_relative_path(encoded).ok_or_else(invalid)?;

        Ok(Self {
            plugin_name: plugin_name.to_string(),
            relative_path,
        })
    }

    /// The original submitted path.
    pub fn path(&self) -> String {
        format!("{}/{}", self.plugin_name, self.relative_path)
    }
}

impl fmt::Display for StoredArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_key())
    }
}

/// Whether `segment` can name a directory in every object store backend.
fn is_storable_segment(segment: &str) -> bool {
    segment != "."
        && segment != ".."
        && !segment
            .chars()
            .any(|c| c == '\\' || c == ':' || c.is_control())
}

/// Reversible, `/`-free encoding of a path below the plugin directory.
pub fn encode_relative_path(relative_path: &str) -> String {
    URL_SAFE_NO_PAD.encode(relative_path.as_bytes())
}

/// Returns `None` for text that is not valid base64 of UTF-8.
pub fn decode_relative_path(encoded: &str) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(encoded).ok()?;
    String::from_utf8(bytes).ok()
}

/// First segment of a stored key or submitted path.
pub fn plugin_name_of(key: &str) -> &str {
    key.split('/').next().unwrap_or(key)
}
