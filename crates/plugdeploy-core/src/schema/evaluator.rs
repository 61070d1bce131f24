//! Schema evaluator.
//!
//! Schema sources are declarative YAML (or JSON) documents describing node
//! types, their scalar properties and their edges. Evaluation parses and
//! validates the document and renders each node type into a
//! [`SchemaDefinition`]; no contributed code is executed.
//!
//! ```yaml
//! nodes:
//!   - type_name: TypeX
//!     properties:
//!       - { name: node_key, type: string, index: [hash], upsert: true }
//!       - { name: pid, type: int, index: [int] }
//!     edges:
//!       - { name: children, cardinality: to_many, reverse: true }
//! ```

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use plugdeploy_types::error::DeployError;
use plugdeploy_types::plugin::PluginFile;
use plugdeploy_types::schema::{
    EdgeCardinality, EdgeSpec, NodeSchemaSpec, PropertySpec, SchemaDefinition, SchemaDocument,
};

/// Why a single schema source failed to evaluate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EvaluationError {
    #[error("source is not valid UTF-8")]
    NotUtf8,

    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid schema: {0}")]
    Invalid(String),
}

/// Evaluate one schema source into its definitions, in document order.
pub fn evaluate(source: &str) -> Result<Vec<SchemaDefinition>, EvaluationError> {
    let blank = source.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#')
    });
    if blank {
        return Ok(Vec::new());
    }

    // `null` and `~` documents deserialize to `None`.
    let document: SchemaDocument = serde_yaml_ng::from_str::<Option<SchemaDocument>>(source)
        .map_err(|e| EvaluationError::Parse(e.to_string()))?
        .unwrap_or_default();

    let mut seen = HashSet::new();
    let mut definitions = Vec::with_capacity(document.nodes.len());
    for node in &document.nodes {
        validate_node(node)?;
        if !seen.insert(node.type_name.as_str()) {
            return Err(EvaluationError::Invalid(format!(
                "type '{}' is declared more than once",
                node.type_name
            )));
        }
        definitions.push(render(node));
    }

    Ok(definitions)
}

/// Evaluate every schema source of a deployment.
///
/// Across sources, a later definition with the same `type_name` replaces the
/// earlier one and takes over its position. The first failing source aborts
/// the whole evaluation.
pub fn evaluate_all(sources: &[PluginFile]) -> Result<Vec<SchemaDefinition>, DeployError> {
    let mut merged: Vec<SchemaDefinition> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for source in sources {
        let evaluation_error = |e: EvaluationError| DeployError::Evaluation {
            path: source.path.clone(),
            message: e.to_string(),
        };

        let text = std::str::from_utf8(&source.contents)
            .map_err(|_| evaluation_error(EvaluationError::NotUtf8))?;
        let definitions = evaluate(text).map_err(evaluation_error)?;

        tracing::debug!(
            path = %source.path,
            types = definitions.len(),
            "evaluated schema source"
        );

        for definition in definitions {
            match positions.get(&definition.type_name) {
                Some(&index) => {
                    tracing::debug!(
                        type_name = %definition.type_name,
                        path = %source.path,
                        "schema definition overrides an earlier source"
                    );
                    merged[index] = definition;
                }
                None => {
                    positions.insert(definition.type_name.clone(), merged.len());
                    merged.push(definition);
                }
            }
        }
    }

    Ok(merged)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_node(node: &NodeSchemaSpec) -> Result<(), EvaluationError> {
    if !is_identifier(&node.type_name) {
        return Err(EvaluationError::Invalid(format!(
            "type name '{}' must start with a letter and contain only letters, digits and '_'",
            node.type_name
        )));
    }

    let mut fields = HashSet::new();
    let names = node
        .properties
        .iter()
        .map(|p| p.name.as_str())
        .chain(node.edges.iter().map(|e| e.name.as_str()));
    for name in names {
        if !is_identifier(name) {
            return Err(EvaluationError::Invalid(format!(
                "field name '{name}' in type '{}' is not a valid identifier",
                node.type_name
            )));
        }
        if !fields.insert(name) {
            return Err(EvaluationError::Invalid(format!(
                "field '{name}' is declared more than once in type '{}'",
                node.type_name
            )));
        }
    }

    for property in &node.properties {
        validate_property(&node.type_name, property)?;
    }

    Ok(())
}

fn validate_property(type_name: &str, property: &PropertySpec) -> Result<(), EvaluationError> {
    let mut tokenizers = HashSet::new();
    for tokenizer in &property.index {
        if !tokenizer.supports(property.property_type) {
            return Err(EvaluationError::Invalid(format!(
                "{type_name}.{}: tokenizer '{tokenizer}' cannot index a {} property",
                property.name, property.property_type
            )));
        }
        if !tokenizers.insert(*tokenizer) {
            return Err(EvaluationError::Invalid(format!(
                "{type_name}.{}: tokenizer '{tokenizer}' listed twice",
                property.name
            )));
        }
    }

    if property.upsert && property.index.is_empty() {
        return Err(EvaluationError::Invalid(format!(
            "{type_name}.{}: upsert requires an index",
            property.name
        )));
    }

    Ok(())
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render(node: &NodeSchemaSpec) -> SchemaDefinition {
    let field_names: Vec<&str> = node
        .properties
        .iter()
        .map(|p| p.name.as_str())
        .chain(node.edges.iter().map(|e| e.name.as_str()))
        .collect();

    let mut type_declaration = format!("type {} {{\n", node.type_name);
    for name in &field_names {
        type_declaration.push_str(&format!("  {name}\n"));
    }
    type_declaration.push('}');

    let predicates: Vec<String> = node
        .properties
        .iter()
        .map(render_property)
        .chain(node.edges.iter().map(render_edge))
        .collect();

    SchemaDefinition {
        type_name: node.type_name.clone(),
        type_declaration,
        schema_declaration: predicates.join("\n"),
    }
}

fn render_property(property: &PropertySpec) -> String {
    let mut line = format!("{}: {}", property.name, property.property_type);
    if !property.index.is_empty() {
        let tokenizers: Vec<String> = property.index.iter().map(|t| t.to_string()).collect();
        line.push_str(&format!(" @index({})", tokenizers.join(", ")));
    }
    if property.upsert {
        line.push_str(" @upsert");
    }
    line.push_str(" .");
    line
}

fn render_edge(edge: &EdgeSpec) -> String {
    let target = match edge.cardinality {
        EdgeCardinality::ToOne => "uid",
        EdgeCardinality::ToMany => "[uid]",
    };
    let reverse = if edge.reverse { " @reverse" } else { "" };
    format!("{}: {target}{reverse} .", edge.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TYPE_X: &str = r#"
nodes:
  - type_name: TypeX
    properties:
      - { name: node_key, type: string, index: [hash], upsert: true }
      - { name: pid, type: int, index: [int] }
      - { name: image_name, type: string }
    edges:
      - { name: children, cardinality: to_many, reverse: true }
      - { name: parent, cardinality: to_one }
"#;

    #[test]
    fn test_renders_type_and_predicates() {
        let defs = evaluate(TYPE_X).unwrap();
        assert_eq!(defs.len(), 1);
        let def = &defs[0];

        assert_eq!(def.type_name, "TypeX");
        assert_eq!(
            def.type_declaration,
            "type TypeX {\n  node_key\n  pid\n  image_name\n  children\n  parent\n}"
        );
        assert_eq!(
            def.schema_declaration,
            "node_key: string @index(hash) @upsert .\n\
             pid: int @index(int) .\n\
             image_name: string .\n\
             children: [uid] @reverse .\n\
             parent: uid ."
        );
    }

    #[test]
    fn test_preserves_document_order() {
        let source = r#"
nodes:
  - type_name: Zeta
  - type_name: Alpha
  - type_name: Mid
"#;
        let names: Vec<_> = evaluate(source).unwrap().into_iter().map(|d| d.type_name).collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn test_accepts_json_documents() {
        let source = r#"{"nodes": [{"type_name": "Json", "properties": [{"name": "n", "type": "float"}]}]}"#;
        let defs = evaluate(source).unwrap();
        assert_eq!(defs[0].schema_declaration, "n: float .");
    }

    #[test]
    fn test_empty_and_comment_only_sources() {
        assert!(evaluate("").unwrap().is_empty());
        assert!(evaluate("   \n").unwrap().is_empty());
        assert!(evaluate("# nothing here yet\n").unwrap().is_empty());
        assert!(evaluate("nodes: []").unwrap().is_empty());
    }

    #[test]
    fn test_executable_code_is_a_parse_error() {
        let source = "class TypeXSchema(NodeSchema):\n    def __init__(self):\n        super().__init__()\n";
        assert!(matches!(evaluate(source), Err(EvaluationError::Parse(_))));
    }

    #[test]
    fn test_rejects_invalid_names() {
        let bad_type = "nodes:\n  - type_name: 9Lives\n";
        assert!(matches!(evaluate(bad_type), Err(EvaluationError::Invalid(_))));

        let bad_field = "nodes:\n  - type_name: T\n    properties:\n      - { name: 'a b', type: string }\n";
        assert!(matches!(evaluate(bad_field), Err(EvaluationError::Invalid(_))));
    }

    #[test]
    fn test_rejects_duplicate_fields_and_types() {
        let dup_field = r#"
nodes:
  - type_name: T
    properties:
      - { name: x, type: string }
    edges:
      - { name: x, cardinality: to_one }
"#;
        assert!(matches!(evaluate(dup_field), Err(EvaluationError::Invalid(m)) if m.contains("'x'")));

        let dup_type = "nodes:\n  - type_name: T\n  - type_name: T\n";
        assert!(matches!(evaluate(dup_type), Err(EvaluationError::Invalid(_))));
    }

    #[test]
    fn test_rejects_incompatible_or_missing_index() {
        let wrong_tokenizer = "nodes:\n  - type_name: T\n    properties:\n      - { name: pid, type: int, index: [hash] }\n";
        assert!(matches!(evaluate(wrong_tokenizer), Err(EvaluationError::Invalid(_))));

        let upsert_without_index = "nodes:\n  - type_name: T\n    properties:\n      - { name: k, type: string, upsert: true }\n";
        assert!(matches!(evaluate(upsert_without_index), Err(EvaluationError::Invalid(_))));
    }

    #[test]
    fn test_rejects_repeated_tokenizer() {
        let repeated = "nodes:\n  - type_name: T\n    properties:\n      - { name: k, type: string, index: [hash, exact, hash] }\n";
        let err = evaluate(repeated).unwrap_err();
        assert!(matches!(err, EvaluationError::Invalid(msg) if msg.contains("listed twice")));
    }

    #[test]
    fn test_evaluate_all_last_write_wins() {
        let first = PluginFile::new(
            "alpha/schema.py",
            "nodes:\n  - type_name: A\n    properties:\n      - { name: old, type: string }\n  - type_name: B\n",
        );
        let second = PluginFile::new(
            "beta/schema.py",
            "nodes:\n  - type_name: C\n  - type_name: A\n    properties:\n      - { name: new, type: int }\n",
        );

        let defs = evaluate_all(&[first, second]).unwrap();
        let names: Vec<_> = defs.iter().map(|d| d.type_name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(defs[0].schema_declaration, "new: int .");
    }

    #[test]
    fn test_evaluate_all_reports_failing_path() {
        let good = PluginFile::new("alpha/schema.py", "nodes: []");
        let bad = PluginFile::new("beta/schemas.py", "nodes: [ {type_name: ");

        let err = evaluate_all(&[good, bad]).unwrap_err();
        assert!(matches!(err, DeployError::Evaluation { path, .. } if path == "beta/schemas.py"));
    }

    #[test]
    fn test_evaluate_all_rejects_non_utf8() {
        let bad = PluginFile::new("alpha/schema.py", vec![0xff, 0xfe, 0x00]);
        let err = evaluate_all(&[bad]).unwrap_err();
        assert!(matches!(err, DeployError::Evaluation { message, .. } if message.contains("UTF-8")));
    }
}
