//! Proposal reconciliation engine.
//!
//! Reconciles an "expected" collection of structured change proposals against
//! an "actual" collection produced by an agent run: configurable field-level
//! normalization, named value transformers, path-based exclusions, greedy
//! bipartite matching, and a detailed mismatch report.
//!
//! ## Architectural Layer
//!
//! **Business logic.** This crate has no I/O dependencies and no module-level
//! mutable state. All operations are synchronous and pure; configuration and
//! the transformer registry arrive as in-memory parameters, and inputs are
//! never mutated. The evaluation harness that produces proposals and the
//! subscriber that consumes `tracing` events are external collaborators —
//! everything here works identically with logging absent.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`types`] | Proposal data model, normalized projection, configuration, report |
//! | [`path`] | Typed field paths, parsing, prefix-based ignore matching |
//! | [`transform`] | Named transformer registry and per-path application |
//! | [`canonical`] | Deterministic canonical forms of JSON-like values |
//! | [`normalize`] | Reduction of raw proposals to their comparison projection |
//! | [`matcher`] | Greedy set reconciliation and strict structural matching |
//! | [`errors`] | Boundary shape errors |

pub mod canonical;
pub mod errors;
pub mod matcher;
pub mod normalize;
pub mod path;
pub mod transform;
pub mod types;

// Re-export the operational surface at the crate root for ergonomic usage.
pub use canonical::{canonical_string, canonicalize};
pub use errors::ShapeError;
pub use matcher::{compare_proposal_sets, deep_strict_match, proposal_matches};
pub use normalize::normalize_proposal;
pub use path::{should_ignore_path, FieldPath, PathSegment};
pub use transform::{apply_transformer, TransformSide, Transformer, TransformerRegistry};
pub use types::{
    ComparisonOverrides, ComparisonReport, ExpectedProposal, NormalizationRules,
    NormalizedProposal, Proposal, ProposalStatus, QueryDefinition, ValidationConfig,
};
