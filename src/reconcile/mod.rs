//! Structured reconciliation validator
//!
//! Downstream extraction (typically an LLM) sees anonymized text and
//! naturally emits mapping tokens in place of PII. This validator is the
//! seam that confirms the payload's shape early, swaps tokens back to
//! original values through the session store, and re-validates the result
//! strictly before anyone consumes it.
//!
//! The pass is a small state machine: `Raw -> PreValidated -> Reconciled
//! -> Done`, terminal on success or on a recorded validation failure. By
//! design the failure path degrades to an empty result plus a logged
//! warning instead of an `Err` - structured extraction is best effort,
//! and a malformed payload must not unwind past the caller.

pub mod schema;

pub use schema::{FieldRule, PayloadSchema};

use crate::domain::ValidationPhase;
use crate::mapping::EntityMappingStore;
use serde_json::{Map, Value};

/// Outcome of one reconciliation pass
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    /// Reconciled field mapping; empty when validation failed
    pub fields: Map<String, Value>,
    /// Which phase failed, if any
    pub failure: Option<ValidationPhase>,
}

impl ReconcileOutcome {
    fn done(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            failure: None,
        }
    }

    fn failed(phase: ValidationPhase) -> Self {
        Self {
            fields: Map::new(),
            failure: Some(phase),
        }
    }

    /// Whether both validation phases passed
    pub fn is_valid(&self) -> bool {
        self.failure.is_none()
    }
}

/// Internal validator state, logged at each transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValidatorState {
    Raw,
    PreValidated,
    Reconciled,
    Done,
}

/// Two-phase validator over anonymized structured payloads
pub struct ReconciliationValidator {
    permissive: PayloadSchema,
    strict: PayloadSchema,
}

impl ReconciliationValidator {
    /// Create a validator from explicit permissive and strict schemas
    pub fn new(permissive: PayloadSchema, strict: PayloadSchema) -> Self {
        Self { permissive, strict }
    }

    /// Parse, pre-validate, reconcile, and strictly re-validate a raw
    /// payload.
    ///
    /// The store is read through a snapshot and never mutated. Schema or
    /// parse failures terminate with an empty field mapping and the
    /// failing phase recorded on the outcome (logged, not propagated).
    pub fn reconcile_and_validate(
        &self,
        raw: &str,
        store: &EntityMappingStore,
    ) -> ReconcileOutcome {
        let mut state = ValidatorState::Raw;
        tracing::trace!(state = ?state, "Validating extracted payload");

        // Raw -> PreValidated
        let stripped = strip_code_fences(raw);
        let mut fields: Map<String, Value> = match serde_json::from_str::<Value>(stripped) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                tracing::warn!(
                    phase = %ValidationPhase::Pre,
                    "Payload is not a JSON object: {}",
                    value_kind(&other)
                );
                return ReconcileOutcome::failed(ValidationPhase::Pre);
            }
            Err(e) => {
                tracing::warn!(phase = %ValidationPhase::Pre, error = %e, "Payload parse failed");
                return ReconcileOutcome::failed(ValidationPhase::Pre);
            }
        };

        if let Err(reason) = self.permissive.validate(&fields) {
            tracing::warn!(phase = %ValidationPhase::Pre, reason, "Schema validation failed");
            return ReconcileOutcome::failed(ValidationPhase::Pre);
        }
        state = ValidatorState::PreValidated;
        tracing::debug!(state = ?state, "Payload pre-validated");

        // PreValidated -> Reconciled: rewrite token values through a copy
        // of the store. Multiple fields may resolve against the same entry.
        let snapshot = store.snapshot();
        let mut replaced = 0usize;
        for value in fields.values_mut() {
            let Some(text) = value.as_str() else { continue };
            for mappings in snapshot.values() {
                if let Some((original, _)) = mappings.iter().find(|(_, token)| *token == text) {
                    *value = Value::String(original.clone());
                    replaced += 1;
                    break;
                }
            }
        }
        state = ValidatorState::Reconciled;
        tracing::debug!(state = ?state, replaced, "Payload reconciled");

        // Reconciled -> Done
        if let Err(reason) = self.strict.validate(&fields) {
            tracing::warn!(phase = %ValidationPhase::Post, reason, "Schema validation failed");
            return ReconcileOutcome::failed(ValidationPhase::Post);
        }
        state = ValidatorState::Done;
        tracing::debug!(state = ?state, "Reconciliation complete");

        ReconcileOutcome::done(fields)
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Strip surrounding markdown code-fence markup from a raw payload.
///
/// Extraction output is frequently wrapped in ```` ```json ```` blocks;
/// anything outside the first fenced block is discarded. Input without
/// fences passes through trimmed.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();

    if let Some(start) = trimmed.find("```") {
        let after_marker = &trimmed[start + 3..];
        // Skip a language tag like `json` up to the first newline
        let body_start = after_marker.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after_marker[body_start..];
        if let Some(end) = body.find("```") {
            return body[..end].trim();
        }
    }

    trimmed
}
