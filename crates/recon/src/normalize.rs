//! Reduction of raw proposals to their comparison projection.
//!
//! Normalization is lossy by design: timestamps, descriptions, and review
//! status never influence whether two proposals represent the same logical
//! change, so they are dropped here. The input is never mutated and missing
//! optional fields propagate as absent keys instead of failing.

use serde_json::{Map, Value};
use tracing::debug;

use crate::path::FieldPath;
use crate::types::{fields, NormalizationRules, NormalizedProposal, Proposal, ValidationConfig};

/// Converts a raw proposal into its comparison-ready projection.
///
/// When `config` carries [`NormalizationRules`], extraction is driven
/// entirely by those rules (output field name → source path into the
/// proposal's JSON form). Otherwise the fixed projection applies:
///
/// - `creation` → `changeType`, `relatedUserId`, `mutationVariables`
///   (from `mutationQuery.variables`);
/// - `change` → `changeType`, `changedField`, `newValue`,
///   `mutationQueryPropertyPath` (from `mutationQuery.propertyPath`),
///   `relatedUserId`, `mutationVariables`.
///
/// Absent source fields simply stay absent in the output.
pub fn normalize_proposal(
    proposal: &Proposal,
    config: Option<&ValidationConfig>,
) -> NormalizedProposal {
    if let Some(rules) = config.and_then(|config| config.normalization.as_ref()) {
        return normalize_with_rules(proposal, rules);
    }
    normalize_fixed(proposal)
}

fn normalize_fixed(proposal: &Proposal) -> NormalizedProposal {
    match proposal {
        Proposal::Creation {
            related_user_id,
            mutation_query,
            ..
        } => NormalizedProposal::creation(
            related_user_id.clone(),
            mutation_query.as_ref().map(|query| query.variables.clone()),
        ),
        Proposal::Change {
            related_user_id,
            mutation_query,
            changed_field,
            new_value,
            ..
        } => NormalizedProposal::change(
            changed_field.clone(),
            new_value.clone(),
            mutation_query
                .as_ref()
                .and_then(|query| query.property_path.clone()),
            related_user_id.clone(),
            mutation_query.as_ref().map(|query| query.variables.clone()),
        ),
    }
}

fn normalize_with_rules(proposal: &Proposal, rules: &NormalizationRules) -> NormalizedProposal {
    let raw = match serde_json::to_value(proposal) {
        Ok(value) => value,
        Err(error) => {
            debug!(%error, "proposal not representable as JSON; using fixed extraction");
            return normalize_fixed(proposal);
        }
    };
    let extraction = match proposal {
        Proposal::Change { .. } => &rules.change,
        Proposal::Creation { .. } => &rules.creation,
    };

    let mut map = Map::new();
    let change_type = match proposal {
        Proposal::Change { .. } => fields::CHANGE,
        Proposal::Creation { .. } => fields::CREATION,
    };
    map.insert(fields::CHANGE_TYPE.into(), Value::String(change_type.into()));
    for (output_field, source_path) in extraction {
        if let Some(value) = FieldPath::parse(source_path).resolve(&raw) {
            map.insert(output_field.clone(), value.clone());
        }
    }
    NormalizedProposal::from_map(map)
}
