//! Uniform access patterns over generic document nodes.
//!
//! Three patterns cover every field in a project description:
//! scalar-or-default, sequence (with bare-scalar shorthand), and "variety"
//! dispatch where a field may be a scalar, a sequence, or a map. Each
//! pattern fails with a schema error naming the offending key, so loaders
//! never need to re-inspect node shapes themselves.

use std::collections::BTreeSet;

use toml::Value;

use crate::error::{Result, SchemaError};

/// The shape of a node, classified once at the parse boundary.
#[derive(Debug)]
pub enum Variety<'a> {
    Scalar(&'a Value),
    Sequence(&'a [Value]),
    Map(&'a toml::Table),
}

/// Classify a node into its variety.
pub fn classify(node: &Value) -> Variety<'_> {
    match node {
        Value::Array(items) => Variety::Sequence(items),
        Value::Table(table) => Variety::Map(table),
        other => Variety::Scalar(other),
    }
}

/// Whether a node is a scalar (neither sequence nor map).
pub fn is_scalar(node: &Value) -> bool {
    !matches!(node, Value::Array(_) | Value::Table(_))
}

/// Look up a key in a map node. A non-map node has no keys.
pub fn get<'a>(node: &'a Value, key: &str) -> Option<&'a Value> {
    node.as_table().and_then(|t| t.get(key))
}

/// Render a scalar node as a string.
pub fn scalar_to_string(key: &str, node: &Value) -> Result<String> {
    match node {
        Value::String(s) => Ok(s.clone()),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Boolean(b) => Ok(b.to_string()),
        Value::Datetime(d) => Ok(d.to_string()),
        _ => Err(SchemaError::WrongKind {
            key: key.to_string(),
            expected: "scalar",
        }),
    }
}

/// Scalar-or-default: missing key yields the default, a present
/// non-scalar node is an error.
pub fn get_scalar(node: &Value, key: &str, default: &str) -> Result<String> {
    match get(node, key) {
        None => Ok(default.to_string()),
        Some(v) => scalar_to_string(key, v),
    }
}

/// Boolean scalar with a `false` default.
pub fn get_bool(node: &Value, key: &str) -> Result<bool> {
    match get(node, key) {
        None => Ok(false),
        Some(Value::Boolean(b)) => Ok(*b),
        Some(_) => Err(SchemaError::WrongKind {
            key: key.to_string(),
            expected: "boolean",
        }),
    }
}

/// Sequence of scalars from a node: a bare scalar is a one-element
/// sequence; anything else requires a true sequence.
pub fn sequence_of(key: &str, node: &Value) -> Result<Vec<String>> {
    match node {
        Value::Array(items) => items
            .iter()
            .map(|v| scalar_to_string(key, v))
            .collect(),
        v if is_scalar(v) => Ok(vec![scalar_to_string(key, v)?]),
        _ => Err(SchemaError::WrongKind {
            key: key.to_string(),
            expected: "sequence",
        }),
    }
}

/// Sequence under a key: missing yields empty.
pub fn get_sequence(node: &Value, key: &str) -> Result<Vec<String>> {
    match get(node, key) {
        None => Ok(Vec::new()),
        Some(v) => sequence_of(key, v),
    }
}

/// Sequence under a key, collected into an ordered set.
pub fn get_sequence_set(node: &Value, key: &str) -> Result<BTreeSet<String>> {
    Ok(get_sequence(node, key)?.into_iter().collect())
}

/// Map under a key: missing yields `None`, a non-map node is an error.
pub fn get_map<'a>(node: &'a Value, key: &str) -> Result<Option<&'a toml::Table>> {
    match get(node, key) {
        None => Ok(None),
        Some(Value::Table(t)) => Ok(Some(t)),
        Some(_) => Err(SchemaError::WrongKind {
            key: key.to_string(),
            expected: "map",
        }),
    }
}

/// A raw insertion block: scalar text with one trailing newline stripped.
pub fn get_insertion(node: &Value, key: &str) -> Result<String> {
    let s = get_scalar(node, key, "")?;
    Ok(s.strip_suffix('\n').map(str::to_string).unwrap_or(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Value {
        s.parse().unwrap()
    }

    #[test]
    fn classify_forms() {
        let doc = parse("a = 1\nb = [1, 2]\n[c]\nx = 1");
        assert!(matches!(classify(get(&doc, "a").unwrap()), Variety::Scalar(_)));
        assert!(matches!(
            classify(get(&doc, "b").unwrap()),
            Variety::Sequence(_)
        ));
        assert!(matches!(classify(get(&doc, "c").unwrap()), Variety::Map(_)));
    }

    #[test]
    fn scalar_or_default() {
        let doc = parse("host = \"example.org\"");
        assert_eq!(get_scalar(&doc, "host", "x").unwrap(), "example.org");
        assert_eq!(get_scalar(&doc, "missing", "x").unwrap(), "x");
    }

    #[test]
    fn scalar_rejects_map() {
        let doc = parse("[host]\nx = 1");
        assert!(get_scalar(&doc, "host", "").is_err());
    }

    #[test]
    fn bare_scalar_is_one_element_sequence() {
        let doc = parse("files = \"src/lib.c\"");
        assert_eq!(get_sequence(&doc, "files").unwrap(), vec!["src/lib.c"]);
    }

    #[test]
    fn sequence_of_scalars() {
        let doc = parse("files = [\"a.c\", \"b.c\"]");
        assert_eq!(get_sequence(&doc, "files").unwrap(), vec!["a.c", "b.c"]);
    }

    #[test]
    fn missing_sequence_is_empty() {
        let doc = parse("x = 1");
        assert!(get_sequence(&doc, "files").unwrap().is_empty());
    }

    #[test]
    fn sequence_rejects_map() {
        let doc = parse("[files]\nx = 1");
        assert!(get_sequence(&doc, "files").is_err());
    }

    #[test]
    fn numeric_scalars_stringify() {
        let doc = parse("version = 1");
        assert_eq!(get_scalar(&doc, "version", "").unwrap(), "1");
    }

    #[test]
    fn insertion_strips_one_trailing_newline() {
        let doc = parse("pre_sources = \"line1\\nline2\\n\"");
        assert_eq!(get_insertion(&doc, "pre_sources").unwrap(), "line1\nline2");
    }
}
