//! Boundary error types for the reconciliation engine.
//!
//! The comparison path itself never errors: a non-match is a normal outcome
//! reported in [`crate::types::ComparisonReport`], and unknown transformer
//! names fail open. [`ShapeError`] only exists at the conversion boundary,
//! where untyped JSON is admitted as a normalized proposal.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why an untyped JSON value was rejected as a normalized proposal.
///
/// Produced by: [`crate::types::NormalizedProposal::from_value`].
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum ShapeError {
    /// The value is not a JSON object.
    #[error("normalized proposal must be a JSON object, got {found}")]
    NotAnObject {
        /// The JSON kind that was found instead.
        found: String,
    },

    /// The object carries no `changeType` discriminant.
    #[error("normalized proposal is missing its changeType discriminant")]
    MissingChangeType,

    /// The `changeType` value is neither `change` nor `creation`.
    ///
    /// The union is closed: no other discriminant values are valid.
    #[error("unknown changeType '{found}' (expected 'change' or 'creation')")]
    UnknownChangeType {
        /// The discriminant value that was found.
        found: String,
    },
}
