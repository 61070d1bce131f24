//! Schema domain types.
//!
//! A schema source is a declarative document ([`SchemaDocument`]) listing
//! node types. Each node type is materialized into a [`SchemaDefinition`]:
//! the Dgraph `type` block plus the predicate declarations it needs.

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Type names shipped with the platform. Deployments never alter them.
pub const BUILTIN_NODE_TYPES: [&str; 11] = [
    "Asset",
    "File",
    "IpAddress",
    "IpConnection",
    "IpPort",
    "Lens",
    "NetworkConnection",
    "ProcessInboundConnection",
    "ProcessOutboundConnection",
    "Process",
    "Risk",
];

// ---------------------------------------------------------------------------
// SchemaDefinition
// ---------------------------------------------------------------------------

/// A materialized node type, identified by `type_name` alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub type_name: String,
    /// Dgraph `type Name { ... }` block.
    pub type_declaration: String,
    /// Predicate lines, one per field.
    pub schema_declaration: String,
}

impl PartialEq for SchemaDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name
    }
}

impl Eq for SchemaDefinition {}

impl Hash for SchemaDefinition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_name.hash(state);
    }
}

// ---------------------------------------------------------------------------
// BuiltinNodeSet
// ---------------------------------------------------------------------------

/// Immutable set of reserved type names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinNodeSet {
    names: BTreeSet<String>,
}

impl BuiltinNodeSet {
    pub fn contains(&self, type_name: &str) -> bool {
        self.names.contains(type_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for BuiltinNodeSet {
    fn default() -> Self {
        Self {
            names: BUILTIN_NODE_TYPES.iter().map(|n| n.to_string()).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Declarative schema description
// ---------------------------------------------------------------------------

/// Top-level content of a schema source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDocument {
    #[serde(default)]
    pub nodes: Vec<NodeSchemaSpec>,
}

/// One node type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeSchemaSpec {
    pub type_name: String,
    #[serde(default)]
    pub properties: Vec<PropertySpec>,
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
}

/// A scalar predicate of a node type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertySpec {
    pub name: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub index: Vec<Tokenizer>,
    #[serde(default)]
    pub upsert: bool,
}

/// A uid predicate pointing at other nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EdgeSpec {
    pub name: String,
    pub cardinality: EdgeCardinality,
    /// Ask the store to maintain the reverse edge (`~name`).
    #[serde(default)]
    pub reverse: bool,
}

/// Scalar types supported by the graph store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    String,
    Int,
    Float,
    Bool,
    Datetime,
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyType::String => write!(f, "string"),
            PropertyType::Int => write!(f, "int"),
            PropertyType::Float => write!(f, "float"),
            PropertyType::Bool => write!(f, "bool"),
            PropertyType::Datetime => write!(f, "datetime"),
        }
    }
}

/// Index tokenizers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tokenizer {
    Hash,
    Exact,
    Term,
    Fulltext,
    Trigram,
    Int,
    Float,
    Bool,
    Year,
    Month,
    Day,
    Hour,
}

impl Tokenizer {
    /// Whether this tokenizer can index a property of the given type.
    pub fn supports(self, property_type: PropertyType) -> bool {
        match self {
            Tokenizer::Hash
            | Tokenizer::Exact
            | Tokenizer::Term
            | Tokenizer::Fulltext
            | Tokenizer::Trigram => property_type == PropertyType::String,
            Tokenizer::Int => property_type == PropertyType::Int,
            Tokenizer::Float => property_type == PropertyType::Float,
            Tokenizer::Bool => property_type == PropertyType::Bool,
            Tokenizer::Year | Tokenizer::Month | Tokenizer::Day | Tokenizer::Hour => {
                property_type == PropertyType::Datetime
            }
        }
    }
}

impl fmt::Display for Tokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tokenizer::Hash => "hash",
            Tokenizer::Exact => "exact",
            Tokenizer::Term => "term",
            Tokenizer::Fulltext => "fulltext",
            Tokenizer::Trigram => "trigram",
            Tokenizer::Int => "int",
            Tokenizer::Float => "float",
            Tokenizer::Bool => "bool",
            Tokenizer::Year => "year",
            Tokenizer::Month => "month",
            Tokenizer::Day => "day",
            Tokenizer::Hour => "hour",
        };
        write!(f, "{name}")
    }
}

/// How many targets an edge may have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeCardinality {
    ToOne,
    ToMany,
}
