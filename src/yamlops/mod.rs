//! # YAML Operations
//!
//! Parsing, dumping, deep-merging, and flattening of YAML trees. The
//! merge/flatten pair implements the resolver precedence rules: later
//! sources override earlier ones, nested mappings merge recursively,
//! and flattening joins key paths with dots. Sequences are leaves and
//! are never expanded.

use serde_yaml::{Mapping, Value};

use crate::errors::{Error, Result};

/// Parse YAML text into a mapping. Empty input and explicit null both
/// yield an empty mapping; a non-mapping root is an error so callers on
/// the best-effort read path can fall back to the raw text.
pub fn parse(text: &str) -> Result<Mapping> {
    if text.trim().is_empty() {
        return Ok(Mapping::new());
    }
    let value: Value = serde_yaml::from_str(text)
        .map_err(|e| Error::invalid_yaml(format!("Invalid YAML syntax: {}", e)))?;
    match value {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Ok(Mapping::new()),
        _ => Err(Error::invalid_yaml("YAML root is not a mapping")),
    }
}

/// Dump a mapping to YAML text (block style, two-space indent).
pub fn dump(mapping: &Mapping) -> Result<String> {
    serde_yaml::to_string(mapping)
        .map_err(|e| Error::internal(format!("Failed to serialize YAML: {}", e)))
}

/// Recursively merge `source` into `target`. When both sides hold a
/// mapping at the same key the children merge; any other combination
/// overwrites.
pub fn deep_merge(target: &mut Mapping, source: Mapping) {
    for (key, source_value) in source {
        match source_value {
            Value::Mapping(incoming) => match target.get_mut(&key) {
                Some(Value::Mapping(existing)) => deep_merge(existing, incoming),
                _ => {
                    target.insert(key, Value::Mapping(incoming));
                }
            },
            other => {
                target.insert(key, other);
            }
        }
    }
}

/// Merge a list of sources in order (later overrides earlier) and
/// flatten the result to dot notation.
pub fn merge_and_flatten(sources: Vec<Mapping>) -> Mapping {
    let mut merged = Mapping::new();
    for source in sources {
        deep_merge(&mut merged, source);
    }
    flatten(&merged)
}

/// Flatten a nested mapping into a single level keyed by dot-joined
/// paths, e.g. `{server: {port: 8080}}` becomes `{"server.port": 8080}`.
pub fn flatten(mapping: &Mapping) -> Mapping {
    let mut flattened = Mapping::new();
    flatten_into(mapping, "", &mut flattened);
    flattened
}

fn flatten_into(source: &Mapping, prefix: &str, result: &mut Mapping) {
    for (key, value) in source {
        let key_text = key_to_string(key);
        let path = if prefix.is_empty() { key_text } else { format!("{}.{}", prefix, key_text) };
        match value {
            Value::Mapping(nested) => flatten_into(nested, &path, result),
            leaf => {
                result.insert(Value::String(path), leaf.clone());
            }
        }
    }
}

/// Rebuild a nested mapping from dot-notation keys. Inverse of
/// [`flatten`] for trees whose keys contain no literal dots.
pub fn unflatten(flattened: &Mapping) -> Mapping {
    let mut root = Mapping::new();
    for (key, value) in flattened {
        let path = key_to_string(key);
        let mut current = &mut root;
        let segments: Vec<&str> = path.split('.').collect();
        for segment in &segments[..segments.len() - 1] {
            let entry = current
                .entry(Value::String(segment.to_string()))
                .or_insert_with(|| Value::Mapping(Mapping::new()));
            if !entry.is_mapping() {
                *entry = Value::Mapping(Mapping::new());
            }
            current = entry.as_mapping_mut().expect("entry was just set to a mapping");
        }
        current.insert(
            Value::String(segments[segments.len() - 1].to_string()),
            value.clone(),
        );
    }
    root
}

fn key_to_string(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other).unwrap_or_default().trim_end().to_string(),
    }
}
