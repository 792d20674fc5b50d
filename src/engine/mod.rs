//! Anonymization and deanonymization engines
//!
//! [`AnonymizerEngine`] turns a text plus detected spans into an anonymized
//! text and an applied-operator record; [`DeanonymizerEngine`] inverts the
//! transformation given the same session store (and key material, for
//! encrypted spans).
//!
//! Both engines are synchronous and perform no I/O of their own; the only
//! side effects are counter-operator writes into the caller-owned
//! [`EntityMappingStore`] and optional audit logging.
//!
//! # Examples
//!
//! ```
//! use cloak::domain::EntitySpan;
//! use cloak::engine::{AnonymizerEngine, DeanonymizerEngine};
//! use cloak::mapping::EntityMappingStore;
//! use cloak::operators::{OperatorAssignment, OperatorConfig};
//!
//! # fn main() -> cloak::domain::Result<()> {
//! let text = "Mario Rossi lives in Rome";
//! let spans = vec![
//!     EntitySpan::new("PERSON", 0, 11, 0.9, "Mario Rossi"),
//!     EntitySpan::new("LOCATION", 21, 25, 0.8, "Rome"),
//! ];
//! let assignment = OperatorAssignment::with_default(OperatorConfig::entity_counter());
//! let mut store = EntityMappingStore::new();
//!
//! let result = AnonymizerEngine::new().anonymize(text, &spans, &assignment, &mut store)?;
//! assert_eq!(result.text, "<PERSON_0> lives in <LOCATION_0>");
//!
//! let restored =
//!     DeanonymizerEngine::new().deanonymize(&result.text, &result.items, &assignment, &mut store)?;
//! assert_eq!(restored, text);
//! # Ok(())
//! # }
//! ```

use crate::audit::AuditLogger;
use crate::domain::{AnonymizeResult, AppliedOperator, CloakError, EntitySpan, Result};
use crate::mapping::EntityMappingStore;
use crate::operators::{OperatorAssignment, OperatorContext, OperatorRegistry};

/// Check that spans are in-bounds, non-empty, on character boundaries,
/// sorted ascending by `start`, and non-overlapping.
fn validate_spans(text: &str, spans: &[EntitySpan]) -> Result<()> {
    for span in spans {
        if span.is_empty() {
            return Err(CloakError::InvalidSpan(format!(
                "empty span [{}, {}) for '{}'",
                span.start, span.end, span.entity_type
            )));
        }
        if span.end > text.len() {
            return Err(CloakError::InvalidSpan(format!(
                "span [{}, {}) exceeds text length {}",
                span.start,
                span.end,
                text.len()
            )));
        }
        if !text.is_char_boundary(span.start) || !text.is_char_boundary(span.end) {
            return Err(CloakError::InvalidSpan(format!(
                "span [{}, {}) does not fall on character boundaries",
                span.start, span.end
            )));
        }
    }

    for pair in spans.windows(2) {
        if pair[1].start < pair[0].end {
            return Err(CloakError::OverlappingSpans(format!(
                "span [{}, {}) collides with span [{}, {}); \
                 overlap resolution is the detector's responsibility",
                pair[0].start, pair[0].end, pair[1].start, pair[1].end
            )));
        }
    }

    Ok(())
}

/// Applies operators to detected spans, producing anonymized text and the
/// record needed to reverse it later.
pub struct AnonymizerEngine {
    registry: OperatorRegistry,
    audit_logger: Option<AuditLogger>,
}

impl AnonymizerEngine {
    /// Create an engine with the built-in operator set and no audit sink
    pub fn new() -> Self {
        Self {
            registry: OperatorRegistry::with_builtins(),
            audit_logger: None,
        }
    }

    /// Attach an audit logger; every anonymize call is then logged with
    /// hashed values (never plaintext).
    pub fn with_audit(mut self, logger: AuditLogger) -> Self {
        self.audit_logger = Some(logger);
        self
    }

    /// Anonymize `text` by replacing each span with its operator's output.
    ///
    /// Spans must be pre-resolved: ascending by `start` and
    /// non-overlapping. Operators are applied in document order, so
    /// counter tokens mint in first-seen order; the computed replacements
    /// are then spliced right-to-left so earlier spans' offsets stay valid.
    /// The returned record is in left-to-right order with each token's
    /// offsets in the *anonymized* output.
    ///
    /// # Errors
    ///
    /// - [`CloakError::OverlappingSpans`] / [`CloakError::InvalidSpan`] on
    ///   malformed span input
    /// - [`CloakError::UnassignedOperator`] when a type has no assignment
    ///   and no default exists
    /// - operator errors ([`CloakError::Params`], [`CloakError::InvalidKey`],
    ///   [`CloakError::Crypto`]) surfaced unchanged
    pub fn anonymize(
        &self,
        text: &str,
        spans: &[EntitySpan],
        assignment: &OperatorAssignment,
        store: &mut EntityMappingStore,
    ) -> Result<AnonymizeResult> {
        validate_spans(text, spans)?;

        // Operators run in document order so counter tokens mint in
        // first-seen order.
        let mut replacements: Vec<(String, String)> = Vec::with_capacity(spans.len());
        for span in spans {
            let config = assignment.resolve(&span.entity_type)?;
            let operator = self.registry.resolve(&config.operator_name)?;

            let replacement = operator.apply(
                &text[span.start..span.end],
                &mut OperatorContext {
                    entity_type: &span.entity_type,
                    store,
                    params: &config.params,
                },
            )?;
            replacements.push((config.operator_name.clone(), replacement));
        }

        // Splice highest start first, so lower offsets stay valid.
        let mut out = text.to_string();
        for (span, (_, replacement)) in spans.iter().zip(&replacements).rev() {
            out.replace_range(span.start..span.end, replacement);
        }

        // Rebuild left-to-right offsets in the anonymized output.
        let mut items = Vec::with_capacity(spans.len());
        let mut delta: isize = 0;
        for (span, (operator, replacement)) in spans.iter().zip(replacements) {
            let start = (span.start as isize + delta) as usize;
            let end = start + replacement.len();
            delta += replacement.len() as isize - span.len() as isize;

            items.push(AppliedOperator {
                entity_type: span.entity_type.clone(),
                start,
                end,
                operator,
                text: replacement,
            });
        }

        let result = AnonymizeResult::new(out, items);

        tracing::debug!(
            session_id = %store.session_id(),
            spans = spans.len(),
            "Anonymized text"
        );

        if let Some(ref logger) = self.audit_logger {
            logger.log_anonymization(store.session_id(), spans, &result)?;
        }

        Ok(result)
    }
}

impl Default for AnonymizerEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Inverts an anonymization pass using its applied-operator record and the
/// same session store/key material.
pub struct DeanonymizerEngine {
    registry: OperatorRegistry,
}

impl DeanonymizerEngine {
    /// Create an engine with the built-in operator set
    pub fn new() -> Self {
        Self {
            registry: OperatorRegistry::with_builtins(),
        }
    }

    /// Restore the original text from `anonymized_text` and its record.
    ///
    /// Entries are walked in the record's left-to-right order. Each token
    /// is re-located by content match behind a forward cursor rather than
    /// by its recorded offsets, since earlier substitutions change the
    /// text length. The inverse operator is derived from the *recorded*
    /// operator name; parameters (the key) come from `assignment`.
    ///
    /// # Errors
    ///
    /// - [`CloakError::Reconciliation`] when a recorded token is not found
    ///   verbatim (the anonymized text was mutated externally)
    /// - [`CloakError::UnassignedOperator`] when a recorded type resolves
    ///   to no assignment entry
    /// - store lookup and cipher errors surfaced unchanged
    pub fn deanonymize(
        &self,
        anonymized_text: &str,
        items: &[AppliedOperator],
        assignment: &OperatorAssignment,
        store: &mut EntityMappingStore,
    ) -> Result<String> {
        let mut out = anonymized_text.to_string();
        let mut cursor = 0usize;

        for item in items {
            let position = out[cursor..]
                .find(&item.text)
                .map(|p| p + cursor)
                .ok_or_else(|| {
                    CloakError::Reconciliation(format!(
                        "token for '{}' (operator '{}') not found in anonymized text",
                        item.entity_type, item.operator
                    ))
                })?;

            let config = assignment.resolve(&item.entity_type)?;
            let inverse = self.registry.resolve(&item.operator)?.inverse();

            let original = inverse.apply(
                &item.text,
                &mut OperatorContext {
                    entity_type: &item.entity_type,
                    store,
                    params: &config.params,
                },
            )?;

            out.replace_range(position..position + item.text.len(), &original);
            cursor = position + original.len();
        }

        tracing::debug!(
            session_id = %store.session_id(),
            items = items.len(),
            "Deanonymized text"
        );

        Ok(out)
    }
}

impl Default for DeanonymizerEngine {
    fn default() -> Self {
        Self::new()
    }
}
