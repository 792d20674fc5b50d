//! Integration tests for the structured reconciliation validator
//!
//! Exercises the full pipeline: anonymize a text, simulate an extraction
//! payload over the anonymized output, then reconcile it back through the
//! same session store.

use cloak::domain::{EntitySpan, ValidationPhase};
use cloak::engine::AnonymizerEngine;
use cloak::mapping::EntityMappingStore;
use cloak::operators::{OperatorAssignment, OperatorConfig};
use cloak::reconcile::{FieldRule, PayloadSchema, ReconciliationValidator};
use regex::Regex;

fn agent_validator() -> ReconciliationValidator {
    let rules = || {
        vec![
            FieldRule::required("name"),
            FieldRule::required("city"),
            FieldRule::optional("phone_number"),
            FieldRule::optional("email"),
            FieldRule::optional("fiscal_code"),
        ]
    };
    ReconciliationValidator::new(PayloadSchema::permissive(rules()), PayloadSchema::strict(rules()))
}

#[test]
fn extraction_over_anonymized_text_reconciles() {
    let text = "Mario Rossi abita a Roma, telefono 333 1234567";
    let spans = vec![
        EntitySpan::new("PERSON", 0, 11, 0.92, "Mario Rossi"),
        EntitySpan::new("LOCATION", 20, 24, 0.85, "Roma"),
        EntitySpan::new("PHONE_NUMBER", 35, 46, 0.75, "333 1234567"),
    ];
    let assignment = OperatorAssignment::with_default(OperatorConfig::entity_counter());
    let mut store = EntityMappingStore::new();

    let result = AnonymizerEngine::new()
        .anonymize(text, &spans, &assignment, &mut store)
        .unwrap();
    assert_eq!(
        result.text,
        "<PERSON_0> abita a <LOCATION_0>, telefono <PHONE_NUMBER_0>"
    );

    // What an extraction agent would return after reading result.text
    let raw = r#"{
        "name": "<PERSON_0>",
        "city": "<LOCATION_0>",
        "phone_number": "<PHONE_NUMBER_0>"
    }"#;

    let outcome = agent_validator().reconcile_and_validate(raw, &store);

    assert!(outcome.is_valid());
    assert_eq!(outcome.fields["name"], "Mario Rossi");
    assert_eq!(outcome.fields["city"], "Roma");
    assert_eq!(outcome.fields["phone_number"], "333 1234567");
}

#[test]
fn fenced_payload_reconciles() {
    let mut store = EntityMappingStore::new();
    store.token_for("PERSON", "Mario Rossi");
    store.token_for("LOCATION", "Roma");

    let raw = "Here is the extracted data:\n```json\n{\"name\": \"<PERSON_0>\", \"city\": \"<LOCATION_0>\"}\n```\nLet me know if you need anything else.";

    let outcome = agent_validator().reconcile_and_validate(raw, &store);

    assert!(outcome.is_valid());
    assert_eq!(outcome.fields["name"], "Mario Rossi");
    assert_eq!(outcome.fields["city"], "Roma");
}

#[test]
fn mixed_token_and_plain_values() {
    let mut store = EntityMappingStore::new();
    store.token_for("PERSON", "Mario Rossi");

    // The agent anonymized the name but saw the city in plain text
    let raw = r#"{"name": "<PERSON_0>", "city": "Milano"}"#;

    let outcome = agent_validator().reconcile_and_validate(raw, &store);

    assert!(outcome.is_valid());
    assert_eq!(outcome.fields["name"], "Mario Rossi");
    assert_eq!(outcome.fields["city"], "Milano");
}

#[test]
fn malformed_payload_degrades_to_empty() {
    let store = EntityMappingStore::new();

    let outcome = agent_validator().reconcile_and_validate("I could not extract anything.", &store);

    assert!(!outcome.is_valid());
    assert_eq!(outcome.failure, Some(ValidationPhase::Pre));
    assert!(outcome.fields.is_empty());
}

#[test]
fn unminted_token_fails_after_reconciliation() {
    let mut store = EntityMappingStore::new();
    store.token_for("PERSON", "Mario Rossi");

    // <LOCATION_0> was never minted this session; nothing to swap it for.
    let raw = r#"{"name": "<PERSON_0>", "city": "<LOCATION_0>"}"#;

    let outcome = agent_validator().reconcile_and_validate(raw, &store);

    assert!(!outcome.is_valid());
    assert_eq!(outcome.failure, Some(ValidationPhase::Post));
    assert!(outcome.fields.is_empty());
}

#[test]
fn strict_pattern_checks_reconciled_values() {
    let mut store = EntityMappingStore::new();
    store.token_for("EMAIL_ADDRESS", "mariorossi@gmail.com");

    let email = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    let validator = ReconciliationValidator::new(
        PayloadSchema::permissive(vec![FieldRule::required("email").with_pattern(email.clone())]),
        PayloadSchema::strict(vec![FieldRule::required("email").with_pattern(email)]),
    );

    // Token passes the permissive phase, then the reconciled value must
    // satisfy the email pattern in the strict phase.
    let raw = r#"{"email": "<EMAIL_ADDRESS_0>"}"#;
    let outcome = validator.reconcile_and_validate(raw, &store);

    assert!(outcome.is_valid());
    assert_eq!(outcome.fields["email"], "mariorossi@gmail.com");
}
