//! Reconciliation CLI entry point.
//!
//! This binary is the composition root and the in-repo stand-in for the
//! evaluation harness that consumes the engine as a library. Responsibilities:
//!
//! 1. **Parse arguments** — fixture paths, optional validation-config path,
//!    and output verbosity.
//! 2. **Wire observability** — configure `tracing-subscriber` with an env
//!    filter; all structured events emitted by the engine flow through it,
//!    under a span carrying a per-run UUID.
//! 3. **Load inputs** — expected entries (bare or wrapped with overrides),
//!    actual proposals (already normalized, or raw records normalized here
//!    with the supplied config), and the validation configuration.
//! 4. **Run one comparison** — print the report as JSON on stdout and exit
//!    non-zero when the sets do not reconcile.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use recon::{
    compare_proposal_sets, normalize_proposal, ExpectedProposal, NormalizedProposal, Proposal,
    TransformerRegistry, ValidationConfig,
};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(
    name = "recon",
    about = "Reconcile expected change proposals against an agent run's output."
)]
struct Args {
    /// Expected proposals: a JSON array of normalized proposals, each
    /// optionally wrapped as {"proposal": ..., "overrides": ...}.
    #[arg(long)]
    expected: PathBuf,

    /// Actual proposals: a JSON array of normalized proposals, or of raw
    /// proposal records when --raw-actual is set.
    #[arg(long)]
    actual: PathBuf,

    /// Validation configuration file (JSON): ignorePaths, transformers,
    /// normalization rules.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Treat the actual file as raw proposal records and normalize them with
    /// the supplied configuration before matching.
    #[arg(long)]
    raw_actual: bool,

    /// Emit per-field mismatch details at info level instead of debug.
    #[arg(long)]
    details: bool,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("reconcile", %run_id);
    let _guard = span.enter();

    let config = load_config(args.config.as_deref())?;
    let expected = decode_expected(&read(&args.expected)?)
        .with_context(|| format!("parsing expected file {}", args.expected.display()))?;
    let actual = decode_actual(&read(&args.actual)?, args.raw_actual, &config)
        .with_context(|| format!("parsing actual file {}", args.actual.display()))?;
    let registry = TransformerRegistry::with_builtins();

    let report = compare_proposal_sets(&expected, &actual, args.details, &config, &registry);
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("serializing report")?
    );
    info!(
        matches = report.matches,
        matched = report.matched_count,
        missing = report.missing_in_actual.len(),
        unexpected = report.unexpected_in_actual.len(),
        "reconciliation finished"
    );
    Ok(if report.matches {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn load_config(path: Option<&Path>) -> Result<ValidationConfig> {
    match path {
        Some(path) => serde_json::from_str(&read(path)?)
            .with_context(|| format!("parsing config file {}", path.display())),
        None => Ok(ValidationConfig::default()),
    }
}

fn decode_expected(text: &str) -> Result<Vec<ExpectedProposal>> {
    serde_json::from_str(text).context("expected a JSON array of expected entries")
}

fn decode_actual(
    text: &str,
    raw: bool,
    config: &ValidationConfig,
) -> Result<Vec<NormalizedProposal>> {
    if raw {
        let proposals: Vec<Proposal> =
            serde_json::from_str(text).context("expected a JSON array of raw proposals")?;
        return Ok(proposals
            .iter()
            .map(|proposal| normalize_proposal(proposal, Some(config)))
            .collect());
    }
    let values: Vec<serde_json::Value> =
        serde_json::from_str(text).context("expected a JSON array of normalized proposals")?;
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            NormalizedProposal::from_value(value)
                .with_context(|| format!("actual proposal at index {index}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_actual_accepts_normalized_entries() {
        let text = r#"[{"changeType": "creation", "relatedUserId": "u1"}]"#;
        let actual =
            decode_actual(text, false, &ValidationConfig::default()).expect("valid input");
        assert_eq!(actual.len(), 1);
        assert_eq!(actual[0].change_type(), Some("creation"));
    }

    #[test]
    fn decode_actual_rejects_malformed_entries() {
        let text = r#"[{"changedField": "salary"}]"#;
        let result = decode_actual(text, false, &ValidationConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn decode_actual_normalizes_raw_proposals() {
        let text = r#"[{
            "changeType": "change",
            "id": "prop-1",
            "createdAt": "2026-08-01T09:30:00Z",
            "description": "Raise salary",
            "status": "pending",
            "changedField": "salary",
            "newValue": "4500"
        }]"#;
        let actual = decode_actual(text, true, &ValidationConfig::default()).expect("valid input");
        assert_eq!(actual.len(), 1);
        assert_eq!(
            actual[0].as_map().get("newValue"),
            Some(&serde_json::json!("4500"))
        );
        // Timestamps and descriptions never survive normalization.
        assert!(!actual[0].as_map().contains_key("description"));
    }

    #[test]
    fn decode_expected_accepts_both_fixture_forms() {
        let text = r#"[
            {"changeType": "creation"},
            {"proposal": {"changeType": "change"}, "overrides": {"ignorePaths": ["newValue"]}}
        ]"#;
        let expected = decode_expected(text).expect("valid input");
        assert_eq!(expected.len(), 2);
        assert!(expected[0].overrides.is_none());
        assert!(expected[1].overrides.is_some());
    }
}
