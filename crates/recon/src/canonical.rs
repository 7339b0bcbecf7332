//! Deterministic canonical forms for JSON-like values.
//!
//! Two values that are semantically identical JSON — same keys and values
//! regardless of key insertion order, same array elements in the same order —
//! canonicalize to identical output. The canonical form backs both structural
//! equality checks and the deterministic strings the matcher attaches to its
//! mismatch events.
//!
//! `serde_json`'s default `Map` is a `BTreeMap`, so rebuilding an object
//! yields lexicographically ordered keys; this module leans on that and
//! recurses to normalize every nested value. Array order is semantically
//! significant and is preserved, never sorted.

use serde_json::Value;

/// Returns the canonical form of `value`.
///
/// Pure and idempotent: `canonicalize(&canonicalize(x)) == canonicalize(x)`.
/// Handles arbitrary (acyclic) nesting; primitives canonicalize to themselves.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, nested)| (key.clone(), canonicalize(nested)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        primitive => primitive.clone(),
    }
}

/// Serializes `value` to its deterministic canonical string.
///
/// Suitable for logging and diffing: equal values always produce identical
/// strings, independent of how their objects were constructed.
pub fn canonical_string(value: &Value) -> String {
    canonicalize(value).to_string()
}
