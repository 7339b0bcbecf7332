//! Data model for the proposal reconciliation domain.
//!
//! [`Proposal`] is the raw record an upstream agent run emits: a closed
//! two-variant union discriminated by `changeType` (`change` or `creation`).
//! [`NormalizedProposal`] is its lossy comparison projection; the normalizer
//! discards fields irrelevant to equivalence (timestamps, descriptions,
//! status) and keeps only what determines whether two proposals represent the
//! same logical change.
//!
//! Comparison hints never live on the data: an expected proposal travels as
//! [`ExpectedProposal`] — the proposal plus a separate [`ComparisonOverrides`]
//! — so no report-time stripping step exists.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ShapeError;

// ---------------------------------------------------------------------------
// Well-known field names
// ---------------------------------------------------------------------------

/// Field names of the normalized comparison shape, shared by the normalizer,
/// the matcher, and test fixtures.
pub mod fields {
    /// Discriminant present on every normalized proposal.
    pub const CHANGE_TYPE: &str = "changeType";
    /// Logical field key of a `change` proposal.
    pub const CHANGED_FIELD: &str = "changedField";
    /// Value being written by a `change` proposal.
    pub const NEW_VALUE: &str = "newValue";
    /// Property path of the mutation query, e.g. `employee.payments[0].amount`.
    pub const MUTATION_QUERY_PROPERTY_PATH: &str = "mutationQueryPropertyPath";
    /// User the proposal relates to.
    pub const RELATED_USER_ID: &str = "relatedUserId";
    /// Variables of the mutation query.
    pub const MUTATION_VARIABLES: &str = "mutationVariables";

    /// `changeType` value of the field-change variant.
    pub const CHANGE: &str = "change";
    /// `changeType` value of the creation variant.
    pub const CREATION: &str = "creation";
}

// ---------------------------------------------------------------------------
// Raw proposals
// ---------------------------------------------------------------------------

/// Review status of a proposal. Irrelevant to matching; retained because raw
/// proposals carry it on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    /// The proposal has been approved.
    Approved,
    /// The proposal awaits review.
    Pending,
    /// The proposal has been rejected.
    Rejected,
}

/// A query definition attached to a proposal: the query template, its
/// variables, and the property path locating the affected value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDefinition {
    /// The query template string.
    pub query: String,
    /// Key → value variable bindings for the template.
    #[serde(default)]
    pub variables: Map<String, Value>,
    /// Dotted/indexed path to the affected value, e.g.
    /// `employee.payments[0].amount`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_path: Option<String>,
}

/// A raw change proposal as emitted by an agent run.
///
/// A closed union: `changeType` is either `change` or `creation`, nothing
/// else. Fields that the upstream producer sometimes omits are optional here;
/// the normalizer propagates their absence instead of failing (missing data
/// surfaces as an unconstrained or mismatching field during matching).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "changeType")]
pub enum Proposal {
    /// A field-level update to an existing entity.
    #[serde(rename = "change", rename_all = "camelCase")]
    Change {
        /// Stable, caller-unique identifier. Never used for matching.
        id: String,
        /// Creation time of the proposal.
        created_at: DateTime<Utc>,
        /// Human-readable description.
        description: String,
        /// User the proposal relates to.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        related_user_id: Option<String>,
        /// Review status.
        status: ProposalStatus,
        /// Verbatim excerpt justifying the proposal.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        quote: Option<String>,
        /// Read describing the pre-change state.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status_quo_query: Option<QueryDefinition>,
        /// Write applying the change.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mutation_query: Option<QueryDefinition>,
        /// Name → query definitions resolved at apply time.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dynamic_mutation_variables: Option<BTreeMap<String, QueryDefinition>>,
        /// Logical field key that changed.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        changed_field: Option<String>,
        /// Value observed when the proposal was approved.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        previous_value_at_approval: Option<String>,
        /// Value being written.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        new_value: Option<String>,
    },
    /// Creation of a new entity.
    #[serde(rename = "creation", rename_all = "camelCase")]
    Creation {
        /// Stable, caller-unique identifier. Never used for matching.
        id: String,
        /// Creation time of the proposal.
        created_at: DateTime<Utc>,
        /// Human-readable description.
        description: String,
        /// User the proposal relates to.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        related_user_id: Option<String>,
        /// Review status.
        status: ProposalStatus,
        /// Verbatim excerpt justifying the proposal.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        quote: Option<String>,
        /// Write creating the entity.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mutation_query: Option<QueryDefinition>,
        /// Field name → value descriptions of the new entity.
        #[serde(default)]
        properties: BTreeMap<String, String>,
    },
}

// ---------------------------------------------------------------------------
// Normalized proposals
// ---------------------------------------------------------------------------

/// The comparison-ready projection of a proposal.
///
/// Backed by a JSON object so that config-driven normalization rules can emit
/// shapes the engine does not know natively, and so the matcher can detect
/// extra actual-side fields generically. Absence of a key is the engine's
/// notion of "undefined"; `null` is a value and must match like any other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedProposal(Map<String, Value>);

impl NormalizedProposal {
    /// Builds the normalized form of a creation proposal.
    pub fn creation(
        related_user_id: Option<String>,
        mutation_variables: Option<Map<String, Value>>,
    ) -> Self {
        let mut map = Map::new();
        map.insert(fields::CHANGE_TYPE.into(), fields::CREATION.into());
        if let Some(user) = related_user_id {
            map.insert(fields::RELATED_USER_ID.into(), Value::String(user));
        }
        if let Some(variables) = mutation_variables {
            map.insert(fields::MUTATION_VARIABLES.into(), Value::Object(variables));
        }
        Self(map)
    }

    /// Builds the normalized form of a field-change proposal.
    pub fn change(
        changed_field: Option<String>,
        new_value: Option<String>,
        mutation_query_property_path: Option<String>,
        related_user_id: Option<String>,
        mutation_variables: Option<Map<String, Value>>,
    ) -> Self {
        let mut map = Map::new();
        map.insert(fields::CHANGE_TYPE.into(), fields::CHANGE.into());
        if let Some(field) = changed_field {
            map.insert(fields::CHANGED_FIELD.into(), Value::String(field));
        }
        if let Some(value) = new_value {
            map.insert(fields::NEW_VALUE.into(), Value::String(value));
        }
        if let Some(path) = mutation_query_property_path {
            map.insert(
                fields::MUTATION_QUERY_PROPERTY_PATH.into(),
                Value::String(path),
            );
        }
        if let Some(user) = related_user_id {
            map.insert(fields::RELATED_USER_ID.into(), Value::String(user));
        }
        if let Some(variables) = mutation_variables {
            map.insert(fields::MUTATION_VARIABLES.into(), Value::Object(variables));
        }
        Self(map)
    }

    /// Wraps an already-shaped object without validating its `changeType`.
    ///
    /// Used by config-driven normalization, which may legitimately emit
    /// shapes the engine does not know natively.
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Converts an untyped JSON value into a normalized proposal, checking
    /// the minimal shape contract: a JSON object whose `changeType` is
    /// `change` or `creation`.
    pub fn from_value(value: Value) -> Result<Self, ShapeError> {
        let Value::Object(map) = value else {
            return Err(ShapeError::NotAnObject {
                found: json_kind(&value).to_string(),
            });
        };
        match map.get(fields::CHANGE_TYPE).and_then(Value::as_str) {
            Some(fields::CHANGE) | Some(fields::CREATION) => Ok(Self(map)),
            Some(other) => Err(ShapeError::UnknownChangeType {
                found: other.to_string(),
            }),
            None => Err(ShapeError::MissingChangeType),
        }
    }

    /// Returns the `changeType` discriminant, if present.
    pub fn change_type(&self) -> Option<&str> {
        self.0.get(fields::CHANGE_TYPE).and_then(Value::as_str)
    }

    /// Returns the underlying field map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consumes the proposal, returning it as a JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Expected-side wrapper
// ---------------------------------------------------------------------------

/// Per-expected-proposal comparison overrides.
///
/// A present field **replaces** the base [`ValidationConfig`]'s corresponding
/// field wholesale — including replacement by an empty list — while an absent
/// field leaves the base field in effect. Overrides never merge additively.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonOverrides {
    /// Ignore-path patterns replacing the base config's, if present. A single
    /// string is accepted as shorthand for a one-element list.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "one_or_many"
    )]
    pub ignore_paths: Option<Vec<String>>,
    /// Field-path → transformer-name bindings replacing the base config's,
    /// if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformers: Option<BTreeMap<String, String>>,
}

impl ComparisonOverrides {
    /// Returns `true` if neither field is present.
    pub fn is_empty(&self) -> bool {
        self.ignore_paths.is_none() && self.transformers.is_none()
    }
}

/// An expected proposal together with its comparison overrides.
///
/// Keeping the overrides beside — not inside — the proposal means reports can
/// return the proposal as-is; there is no metadata to strip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ExpectedRepr")]
pub struct ExpectedProposal {
    /// The normalized proposal the actual side must account for.
    pub proposal: NormalizedProposal,
    /// Per-proposal comparison overrides, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<ComparisonOverrides>,
}

impl From<NormalizedProposal> for ExpectedProposal {
    fn from(proposal: NormalizedProposal) -> Self {
        Self {
            proposal,
            overrides: None,
        }
    }
}

/// Accepts either the wrapped fixture form `{"proposal": …, "overrides": …}`
/// or a bare normalized proposal.
#[derive(Deserialize)]
#[serde(untagged)]
enum ExpectedRepr {
    Wrapped {
        proposal: NormalizedProposal,
        #[serde(default)]
        overrides: Option<ComparisonOverrides>,
    },
    Bare(NormalizedProposal),
}

impl From<ExpectedRepr> for ExpectedProposal {
    fn from(repr: ExpectedRepr) -> Self {
        match repr {
            ExpectedRepr::Wrapped {
                proposal,
                overrides,
            } => Self {
                proposal,
                overrides,
            },
            ExpectedRepr::Bare(proposal) => proposal.into(),
        }
    }
}

/// Deserializes either a single string or a list of strings.
fn one_or_many<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(single)) => Some(vec![single]),
        Some(OneOrMany::Many(many)) => Some(many),
        None => None,
    })
}

// ---------------------------------------------------------------------------
// Validation configuration
// ---------------------------------------------------------------------------

/// Data-driven normalization rules: per variant, a map from output field name
/// to the source path extracted from the raw proposal's JSON form.
///
/// Lets callers normalize proposal shapes the engine does not know natively;
/// when present, these rules replace the fixed extraction entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizationRules {
    /// Extraction rules for `change`-type proposals.
    #[serde(default)]
    pub change: BTreeMap<String, String>,
    /// Extraction rules for `creation`-type proposals.
    #[serde(default)]
    pub creation: BTreeMap<String, String>,
}

/// Per-invocation comparison configuration.
///
/// Arrives as an in-memory parameter; the engine reads no files and no
/// environment. Path patterns stay in string form here (serde-friendly) and
/// are parsed into [`crate::path::FieldPath`] segments once per comparison.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationConfig {
    /// Field-path patterns excluded from comparison (prefix semantics, see
    /// [`crate::path`]).
    #[serde(default)]
    pub ignore_paths: Vec<String>,
    /// Field-path → transformer-name bindings (exact-path lookup).
    #[serde(default)]
    pub transformers: BTreeMap<String, String>,
    /// Optional data-driven normalization rules; when present they replace
    /// the fixed extraction in [`crate::normalize::normalize_proposal`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalization: Option<NormalizationRules>,
}

// ---------------------------------------------------------------------------
// Comparison report
// ---------------------------------------------------------------------------

/// The outcome of one reconciliation run.
///
/// A non-match is a normal, reportable outcome, never an error: `matches` is
/// `true` iff every expected proposal found an actual counterpart and no
/// actual proposal was left over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    /// `true` iff both mismatch lists are empty.
    pub matches: bool,
    /// Expected proposals with no matching actual, in declaration order.
    pub missing_in_actual: Vec<NormalizedProposal>,
    /// Actual proposals no expected entry accounted for.
    pub unexpected_in_actual: Vec<NormalizedProposal>,
    /// Number of expected/actual pairs that matched.
    pub matched_count: usize,
}
