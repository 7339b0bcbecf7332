//! End-to-end reconciliation behavior: set-level matching, per-proposal
//! overrides, the strict-matching boundary around actual-only fields, and the
//! duplicate tie-break.

use serde_json::{json, Value};

use recon::{
    compare_proposal_sets, normalize_proposal, ComparisonOverrides, ExpectedProposal,
    NormalizedProposal, Proposal, TransformerRegistry, ValidationConfig,
};

fn normalized(value: Value) -> NormalizedProposal {
    NormalizedProposal::from_value(value).expect("valid normalized fixture")
}

fn expected(value: Value) -> ExpectedProposal {
    ExpectedProposal::from(normalized(value))
}

fn with_ignores(value: Value, ignore_paths: &[&str]) -> ExpectedProposal {
    ExpectedProposal {
        proposal: normalized(value),
        overrides: Some(ComparisonOverrides {
            ignore_paths: Some(ignore_paths.iter().map(|s| s.to_string()).collect()),
            transformers: None,
        }),
    }
}

fn registry() -> TransformerRegistry {
    TransformerRegistry::with_builtins()
}

#[test]
fn a_set_reconciles_against_itself() {
    let proposals = vec![
        json!({"changeType": "change", "changedField": "salary", "newValue": "4500"}),
        json!({"changeType": "creation", "relatedUserId": "u1"}),
    ];
    let expected_set: Vec<ExpectedProposal> =
        proposals.iter().cloned().map(expected).collect();
    let actual_set: Vec<NormalizedProposal> =
        proposals.into_iter().map(normalized).collect();

    let report = compare_proposal_sets(
        &expected_set,
        &actual_set,
        false,
        &ValidationConfig::default(),
        &registry(),
    );
    assert!(report.matches);
    assert_eq!(report.matched_count, 2);
    assert!(report.missing_in_actual.is_empty());
    assert!(report.unexpected_in_actual.is_empty());
}

#[test]
fn base_config_ignore_path_suppresses_a_mismatch() {
    let expected_set = vec![expected(
        json!({"changeType": "change", "changedField": "amount", "newValue": "100"}),
    )];
    let actual_set = vec![normalized(
        json!({"changeType": "change", "changedField": "amount", "newValue": "999"}),
    )];
    let config = ValidationConfig {
        ignore_paths: vec!["newValue".into()],
        ..ValidationConfig::default()
    };

    let report = compare_proposal_sets(&expected_set, &actual_set, false, &config, &registry());
    assert!(report.matches);
    assert_eq!(report.matched_count, 1);
}

#[test]
fn per_proposal_override_shadows_the_base_config() {
    let proposal = json!({"changeType": "change", "changedField": "amount", "newValue": "100"});
    let differing = vec![normalized(
        json!({"changeType": "change", "changedField": "amount", "newValue": "999"}),
    )];

    // Override supplies an ignore list the empty base config lacks.
    let report = compare_proposal_sets(
        &[with_ignores(proposal.clone(), &["newValue"])],
        &differing,
        false,
        &ValidationConfig::default(),
        &registry(),
    );
    assert!(report.matches);

    // An explicit empty override replaces, not merges: the non-empty base
    // ignore list no longer applies.
    let base = ValidationConfig {
        ignore_paths: vec!["newValue".into()],
        ..ValidationConfig::default()
    };
    let report = compare_proposal_sets(
        &[with_ignores(proposal, &[])],
        &differing,
        false,
        &base,
        &registry(),
    );
    assert!(!report.matches);
    assert_eq!(report.missing_in_actual.len(), 1);
    assert_eq!(report.unexpected_in_actual.len(), 1);
}

#[test]
fn each_actual_is_consumed_at_most_once() {
    let creation = json!({"changeType": "creation", "relatedUserId": "u1"});
    let expected_set = vec![expected(creation.clone()), expected(creation.clone())];
    let actual_set = vec![normalized(creation.clone())];

    let report = compare_proposal_sets(
        &expected_set,
        &actual_set,
        false,
        &ValidationConfig::default(),
        &registry(),
    );
    assert!(!report.matches);
    assert_eq!(report.matched_count, 1);
    assert_eq!(report.missing_in_actual, vec![normalized(creation)]);
    assert!(report.unexpected_in_actual.is_empty());
}

#[test]
fn later_declared_duplicate_wins_the_tie() {
    // Both expected entries can match the single actual only through their
    // override; the matcher processes the expected list last-to-first, so the
    // later-declared entry consumes the actual and the earlier one is
    // reported missing.
    let first = json!({"changeType": "change", "changedField": "amount", "newValue": "1"});
    let second = json!({"changeType": "change", "changedField": "amount", "newValue": "2"});
    let expected_set = vec![
        with_ignores(first.clone(), &["newValue"]),
        with_ignores(second, &["newValue"]),
    ];
    let actual_set = vec![normalized(
        json!({"changeType": "change", "changedField": "amount", "newValue": "3"}),
    )];

    let report = compare_proposal_sets(
        &expected_set,
        &actual_set,
        false,
        &ValidationConfig::default(),
        &registry(),
    );
    assert_eq!(report.matched_count, 1);
    assert_eq!(report.missing_in_actual, vec![normalized(first)]);
}

#[test]
fn actual_only_field_blocks_the_match_until_ignored() {
    // The strict-matching boundary: the expected side leaves
    // mutationQueryPropertyPath unconstrained, but its presence on the actual
    // side alone is a mismatch under strict containment.
    let expected_set = vec![expected(json!({
        "changeType": "change",
        "changedField": "salary",
        "newValue": "4500",
        "relatedUserId": "emp-1",
    }))];
    let actual_set = vec![normalized(json!({
        "changeType": "change",
        "changedField": "salary",
        "newValue": "4500",
        "relatedUserId": "emp-1",
        "mutationQueryPropertyPath": "employee.payments[0].amount",
    }))];

    let strict = compare_proposal_sets(
        &expected_set,
        &actual_set,
        false,
        &ValidationConfig::default(),
        &registry(),
    );
    assert!(!strict.matches);
    assert_eq!(strict.missing_in_actual.len(), 1);
    assert_eq!(strict.unexpected_in_actual.len(), 1);

    let tolerant = ValidationConfig {
        ignore_paths: vec!["mutationQueryPropertyPath".into()],
        ..ValidationConfig::default()
    };
    let report = compare_proposal_sets(&expected_set, &actual_set, false, &tolerant, &registry());
    assert!(report.matches);
    assert_eq!(report.matched_count, 1);
}

#[test]
fn missing_entries_preserve_declaration_order() {
    let first = json!({"changeType": "change", "changedField": "a", "newValue": "1"});
    let second = json!({"changeType": "change", "changedField": "b", "newValue": "2"});
    let third = json!({"changeType": "change", "changedField": "c", "newValue": "3"});
    let expected_set = vec![
        expected(first.clone()),
        expected(second.clone()),
        expected(third.clone()),
    ];

    let report = compare_proposal_sets(
        &expected_set,
        &[],
        false,
        &ValidationConfig::default(),
        &registry(),
    );
    assert_eq!(
        report.missing_in_actual,
        vec![normalized(first), normalized(second), normalized(third)]
    );
}

#[test]
fn transformers_align_formatting_differences() {
    let expected_set = vec![expected(
        json!({"changeType": "change", "changedField": "name", "newValue": "SAM"}),
    )];
    let actual_set = vec![normalized(
        json!({"changeType": "change", "changedField": "name", "newValue": "sam"}),
    )];
    let config = ValidationConfig {
        transformers: std::collections::BTreeMap::from([(
            "newValue".to_string(),
            "lowercase".to_string(),
        )]),
        ..ValidationConfig::default()
    };

    let report = compare_proposal_sets(&expected_set, &actual_set, false, &config, &registry());
    assert!(report.matches);
}

#[test]
fn unknown_transformer_fails_open_and_matching_proceeds() {
    let proposal = json!({"changeType": "change", "changedField": "name", "newValue": "sam"});
    let config = ValidationConfig {
        transformers: std::collections::BTreeMap::from([(
            "newValue".to_string(),
            "no-such-transformer".to_string(),
        )]),
        ..ValidationConfig::default()
    };

    let report = compare_proposal_sets(
        &[expected(proposal.clone())],
        &[normalized(proposal)],
        false,
        &config,
        &registry(),
    );
    assert!(report.matches);
}

#[test]
fn raw_proposals_normalize_and_reconcile_end_to_end() {
    let raw = json!({
        "changeType": "change",
        "id": "prop-1",
        "createdAt": "2026-08-01T09:30:00Z",
        "description": "Raise salary for emp-1",
        "status": "pending",
        "relatedUserId": "emp-1",
        "changedField": "salary",
        "newValue": "4500",
        "mutationQuery": {
            "query": "mutation { updatePayment }",
            "variables": {"amount": "4500"},
            "propertyPath": "employee.payments[0].amount"
        }
    });
    let proposal: Proposal = serde_json::from_value(raw).expect("valid raw proposal");
    let actual_set = vec![normalize_proposal(&proposal, None)];

    // The fixture author constrains only the fields they care about and
    // ignores the rest of the normalized projection.
    let expected_set = vec![with_ignores(
        json!({"changeType": "change", "changedField": "salary", "newValue": "4500"}),
        &["mutationQueryPropertyPath", "relatedUserId", "mutationVariables"],
    )];

    let report = compare_proposal_sets(
        &expected_set,
        &actual_set,
        false,
        &ValidationConfig::default(),
        &registry(),
    );
    assert!(report.matches);
    assert_eq!(report.matched_count, 1);
}

#[test]
fn inputs_are_never_mutated() {
    let expected_set = vec![expected(
        json!({"changeType": "change", "changedField": "a", "newValue": "1"}),
    )];
    let actual_set = vec![
        normalized(json!({"changeType": "change", "changedField": "a", "newValue": "1"})),
        normalized(json!({"changeType": "creation"})),
    ];
    let expected_before = expected_set.clone();
    let actual_before = actual_set.clone();

    let _ = compare_proposal_sets(
        &expected_set,
        &actual_set,
        false,
        &ValidationConfig::default(),
        &registry(),
    );
    assert_eq!(expected_set, expected_before);
    assert_eq!(actual_set, actual_before);
}
