//! Named value transformers applied before field comparison.
//!
//! A [`TransformerRegistry`] is an explicit name → function map constructed at
//! startup and passed into the matcher by reference; there is no module-level
//! mutable state, so comparisons running in parallel never observe each
//! other's registrations.
//!
//! Configuration binds a concrete field path to a transformer *name*
//! (`ValidationConfig::transformers`); the registry supplies the function. A
//! name with no registered function fails open — the value passes through
//! unchanged and a warning is emitted — because a comparison must still
//! proceed to a reportable result.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::warn;

use crate::path::FieldPath;

// ---------------------------------------------------------------------------
// Transformer functions
// ---------------------------------------------------------------------------

/// Which side of the comparison a value belongs to.
///
/// Most transformers treat both sides identically; the flag exists for the
/// rare asymmetric transformer, e.g. one that reformats only actual-side
/// values to align with a looser expected pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformSide {
    /// The value comes from an expected proposal.
    Expected,
    /// The value comes from an actual proposal.
    Actual,
}

/// A transformer adjusts a field value before comparison.
///
/// Returning `None` lifts the field's constraint entirely: on the expected
/// side the field then imposes no requirement, on the actual side it reads as
/// an absent value.
pub type Transformer = fn(&Value, TransformSide) -> Option<Value>;

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Explicit name → transformer map, dependency-injected into the matcher.
#[derive(Debug, Clone)]
pub struct TransformerRegistry {
    by_name: BTreeMap<String, Transformer>,
}

impl TransformerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            by_name: BTreeMap::new(),
        }
    }

    /// Creates a registry pre-populated with the built-in transformers
    /// `trim`, `lowercase`, and `round`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("trim", trim);
        registry.register("lowercase", lowercase);
        registry.register("round", round);
        registry
    }

    /// Registers `transformer` under `name`, replacing any previous binding.
    pub fn register(&mut self, name: impl Into<String>, transformer: Transformer) {
        self.by_name.insert(name.into(), transformer);
    }

    /// Looks up a transformer by name.
    pub fn get(&self, name: &str) -> Option<Transformer> {
        self.by_name.get(name).copied()
    }
}

impl Default for TransformerRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

/// Applies the transformer configured for `path`, if any, to `value`.
///
/// - No transformer configured for `path`: the value passes through unchanged.
/// - Configured name not present in `registry`: the value passes through
///   unchanged and a warning is emitted (fail-open).
/// - Transformer returns `None`: the field's constraint is lifted; the caller
///   receives `None`.
pub fn apply_transformer(
    value: &Value,
    path: &FieldPath,
    bindings: &BTreeMap<FieldPath, String>,
    registry: &TransformerRegistry,
    side: TransformSide,
) -> Option<Value> {
    let Some(name) = bindings.get(path) else {
        return Some(value.clone());
    };
    match registry.get(name) {
        Some(transformer) => transformer(value, side),
        None => {
            warn!(
                transformer = %name,
                path = %path,
                "unknown transformer name; value passed through unchanged"
            );
            Some(value.clone())
        }
    }
}

// ---------------------------------------------------------------------------
// Built-ins
// ---------------------------------------------------------------------------

/// Trims surrounding whitespace from string values; other types pass through.
fn trim(value: &Value, _side: TransformSide) -> Option<Value> {
    match value.as_str() {
        Some(text) => Some(Value::String(text.trim().to_string())),
        None => Some(value.clone()),
    }
}

/// Lowercases string values; other types pass through.
fn lowercase(value: &Value, _side: TransformSide) -> Option<Value> {
    match value.as_str() {
        Some(text) => Some(Value::String(text.to_lowercase())),
        None => Some(value.clone()),
    }
}

/// Rounds numeric values to the nearest integer; other types pass through.
fn round(value: &Value, _side: TransformSide) -> Option<Value> {
    match value.as_f64() {
        Some(number) => Some(Value::from(number.round() as i64)),
        None => Some(value.clone()),
    }
}
