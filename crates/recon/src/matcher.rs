//! Greedy set-reconciliation of expected and actual proposals.
//!
//! [`compare_proposal_sets`] pairs expected entries with actual entries using
//! greedy first-fit bipartite matching: no backtracking, no optimality
//! guarantee. Matching is **strict containment** equality — any field present
//! on the actual side that the expected side does not constrain is a
//! mismatch unless its path is configured as ignorable — with per-path
//! transformers applied to both sides before comparison.
//!
//! The expected list is processed in reverse declaration order. When
//! duplicate expected entries compete for one actual entry, the
//! later-declared entry therefore wins; this tie-break is deliberate and
//! pinned by tests.
//!
//! Inputs are never mutated: the algorithm works on its own copies, so one
//! engine value may serve concurrent comparisons. Mismatches are reported,
//! never raised; with `log_details` set, per-field mismatch events are
//! emitted at info instead of debug level. The engine functions identically
//! with no tracing subscriber installed.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, info};

use crate::canonical::canonical_string;
use crate::path::{should_ignore_path, FieldPath};
use crate::transform::{apply_transformer, TransformSide, TransformerRegistry};
use crate::types::{
    ComparisonOverrides, ComparisonReport, ExpectedProposal, NormalizedProposal, ValidationConfig,
};

// ---------------------------------------------------------------------------
// Effective configuration
// ---------------------------------------------------------------------------

/// Base config with any per-proposal overrides applied, path patterns parsed.
struct EffectiveConfig<'a> {
    ignore: Vec<FieldPath>,
    transformers: BTreeMap<FieldPath, String>,
    registry: &'a TransformerRegistry,
    log_details: bool,
}

impl<'a> EffectiveConfig<'a> {
    /// A present override field replaces the base field wholesale (including
    /// replacement by an empty list); an absent one leaves the base in effect.
    fn compile(
        base: &ValidationConfig,
        overrides: Option<&ComparisonOverrides>,
        registry: &'a TransformerRegistry,
        log_details: bool,
    ) -> Self {
        let ignore_raw = overrides
            .and_then(|overrides| overrides.ignore_paths.as_deref())
            .unwrap_or(&base.ignore_paths);
        let transformer_raw = overrides
            .and_then(|overrides| overrides.transformers.as_ref())
            .unwrap_or(&base.transformers);
        Self {
            ignore: ignore_raw.iter().map(|raw| FieldPath::parse(raw)).collect(),
            transformers: transformer_raw
                .iter()
                .map(|(path, name)| (FieldPath::parse(path), name.clone()))
                .collect(),
            registry,
            log_details,
        }
    }

    fn ignores(&self, path: &FieldPath) -> bool {
        should_ignore_path(path, &self.ignore)
    }

    fn transform(&self, value: &Value, path: &FieldPath, side: TransformSide) -> Option<Value> {
        apply_transformer(value, path, &self.transformers, self.registry, side)
    }

    fn mismatch(&self, path: &FieldPath, reason: &str, expected: Option<&Value>, actual: Option<&Value>) {
        let expected = expected.map(canonical_string);
        let actual = actual.map(canonical_string);
        if self.log_details {
            info!(
                path = %path,
                reason,
                expected = expected.as_deref(),
                actual = actual.as_deref(),
                "field mismatch"
            );
        } else {
            debug!(
                path = %path,
                reason,
                expected = expected.as_deref(),
                actual = actual.as_deref(),
                "field mismatch"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Set reconciliation
// ---------------------------------------------------------------------------

/// Reconciles an expected proposal set against an actual one.
///
/// Each expected entry's overrides are applied on top of `config`, then the
/// remaining actual entries are searched front-to-back for the first match;
/// a matched actual entry is consumed and can never match twice. The report's
/// `missing_in_actual` preserves the expected list's declaration order.
pub fn compare_proposal_sets(
    expected: &[ExpectedProposal],
    actual: &[NormalizedProposal],
    log_details: bool,
    config: &ValidationConfig,
    registry: &TransformerRegistry,
) -> ComparisonReport {
    debug!(
        expected_count = expected.len(),
        actual_count = actual.len(),
        "comparing proposal sets"
    );

    let mut remaining: Vec<NormalizedProposal> = actual.to_vec();
    let mut missing: Vec<NormalizedProposal> = Vec::new();
    let mut matched_count = 0;

    for entry in expected.iter().rev() {
        let effective =
            EffectiveConfig::compile(config, entry.overrides.as_ref(), registry, log_details);
        let found = remaining
            .iter()
            .position(|candidate| matches_effective(&entry.proposal, candidate, &effective));
        match found {
            Some(index) => {
                remaining.remove(index);
                matched_count += 1;
            }
            None => missing.push(entry.proposal.clone()),
        }
    }
    missing.reverse();

    let matches = missing.is_empty() && remaining.is_empty();
    debug!(
        matches,
        matched_count,
        missing = missing.len(),
        unexpected = remaining.len(),
        "proposal set comparison finished"
    );
    ComparisonReport {
        matches,
        missing_in_actual: missing,
        unexpected_in_actual: remaining,
        matched_count,
    }
}

// ---------------------------------------------------------------------------
// Single-proposal matching
// ---------------------------------------------------------------------------

/// Returns `true` if `actual` satisfies `expected` under `config`.
///
/// Strict containment: every actual-side field must either be constrained by
/// the expected side or be ignorable; every expected-side field must find an
/// equal (post-transform) actual value, unless its path is ignorable or its
/// transformed expected value lifts the constraint.
pub fn proposal_matches(
    expected: &NormalizedProposal,
    actual: &NormalizedProposal,
    config: &ValidationConfig,
    registry: &TransformerRegistry,
) -> bool {
    let effective = EffectiveConfig::compile(config, None, registry, false);
    matches_effective(expected, actual, &effective)
}

fn matches_effective(
    expected: &NormalizedProposal,
    actual: &NormalizedProposal,
    config: &EffectiveConfig<'_>,
) -> bool {
    object_matches(expected.as_map(), actual.as_map(), &FieldPath::root(), config)
}

/// Recursive strict equality for nested values, honoring ignore paths and
/// transformers at every nested path. Arrays match by length and per-index
/// comparison; object key sets must agree up to ignorable paths.
pub fn deep_strict_match(
    expected: &Value,
    actual: &Value,
    config: &ValidationConfig,
    registry: &TransformerRegistry,
    parent_path: &FieldPath,
) -> bool {
    let effective = EffectiveConfig::compile(config, None, registry, false);
    deep_match(expected, actual, parent_path, &effective)
}

fn deep_match(
    expected: &Value,
    actual: &Value,
    parent: &FieldPath,
    config: &EffectiveConfig<'_>,
) -> bool {
    match (expected, actual) {
        (Value::Object(expected_map), Value::Object(actual_map)) => {
            object_matches(expected_map, actual_map, parent, config)
        }
        (Value::Array(expected_items), Value::Array(actual_items)) => {
            if expected_items.len() != actual_items.len() {
                config.mismatch(parent, "array length differs", Some(expected), Some(actual));
                return false;
            }
            for (index, (expected_item, actual_item)) in
                expected_items.iter().zip(actual_items).enumerate()
            {
                let path = parent.child_index(index);
                if config.ignores(&path) {
                    continue;
                }
                if !constrained_match(expected_item, actual_item, &path, config) {
                    return false;
                }
            }
            true
        }
        _ => {
            config.mismatch(parent, "value type differs", Some(expected), Some(actual));
            false
        }
    }
}

fn object_matches(
    expected: &serde_json::Map<String, Value>,
    actual: &serde_json::Map<String, Value>,
    parent: &FieldPath,
    config: &EffectiveConfig<'_>,
) -> bool {
    // Actual-side fields the expected side does not constrain are mismatches
    // unless their path is ignorable.
    for (key, value) in actual {
        if !expected.contains_key(key) {
            let path = parent.child_key(key);
            if !config.ignores(&path) {
                config.mismatch(&path, "unexpected field in actual", None, Some(value));
                return false;
            }
        }
    }

    for (key, expected_value) in expected {
        let path = parent.child_key(key);
        if config.ignores(&path) {
            continue;
        }
        let Some(expected_value) = config.transform(expected_value, &path, TransformSide::Expected)
        else {
            // Transformed to undefined: the field imposes no constraint.
            continue;
        };
        let Some(actual_value) = actual.get(key) else {
            config.mismatch(&path, "field missing in actual", Some(&expected_value), None);
            return false;
        };
        let Some(actual_value) = config.transform(actual_value, &path, TransformSide::Actual)
        else {
            config.mismatch(&path, "actual value transformed to undefined", Some(&expected_value), None);
            return false;
        };
        if !transformed_match(&expected_value, &actual_value, &path, config) {
            return false;
        }
    }
    true
}

/// Compares one child pair: transforms both sides at `path`, then matches.
fn constrained_match(
    expected: &Value,
    actual: &Value,
    path: &FieldPath,
    config: &EffectiveConfig<'_>,
) -> bool {
    let Some(expected) = config.transform(expected, path, TransformSide::Expected) else {
        return true;
    };
    let Some(actual) = config.transform(actual, path, TransformSide::Actual) else {
        config.mismatch(path, "actual value transformed to undefined", Some(&expected), None);
        return false;
    };
    transformed_match(&expected, &actual, path, config)
}

/// Matches two already-transformed values at `path`.
fn transformed_match(
    expected: &Value,
    actual: &Value,
    path: &FieldPath,
    config: &EffectiveConfig<'_>,
) -> bool {
    if expected.is_object() || expected.is_array() {
        return deep_match(expected, actual, path, config);
    }
    if expected == actual {
        true
    } else {
        config.mismatch(path, "value differs", Some(expected), Some(actual));
        false
    }
}
