//! Entity span and applied-operator data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A contiguous `[start, end)` region of text tagged with an entity type
/// and a confidence score.
///
/// Spans are produced by an external detector (see [`crate::detector`]) and
/// are immutable once created. Offsets are byte offsets into the analyzed
/// text and must fall on character boundaries. The anonymization engine
/// expects a pre-resolved, non-overlapping list ordered by `start`;
/// overlap resolution is the detector's responsibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpan {
    /// Entity type label (e.g. `PERSON`, `LOCATION`, `EMAIL_ADDRESS`)
    pub entity_type: String,
    /// Start byte offset in the original text (inclusive)
    pub start: usize,
    /// End byte offset in the original text (exclusive)
    pub end: usize,
    /// Detector confidence score (0.0 - 1.0)
    pub score: f32,
    /// The original text covered by the span
    pub text: String,
}

impl EntitySpan {
    /// Create a new entity span
    pub fn new(
        entity_type: impl Into<String>,
        start: usize,
        end: usize,
        score: f32,
        text: impl Into<String>,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            start,
            end,
            score: score.clamp(0.0, 1.0),
            text: text.into(),
        }
    }

    /// Length of the span in bytes
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether the span is empty (`start >= end`)
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// One entry of the applied-operator record.
///
/// Describes which operator transformed which span of the original text.
/// `start`/`end` are the replacement token's offsets in the *anonymized*
/// output (the original span boundaries no longer exist there), and `text`
/// is the token itself so that deanonymization can re-locate it by content
/// when surrounding edits have shifted offsets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedOperator {
    /// Entity type the operator was applied to
    pub entity_type: String,
    /// Token start offset in the anonymized text
    pub start: usize,
    /// Token end offset in the anonymized text
    pub end: usize,
    /// Stable name of the operator that produced the token
    pub operator: String,
    /// The replacement token placed into the anonymized text
    pub text: String,
}

/// Result of one anonymization pass over a text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnonymizeResult {
    /// The anonymized text
    pub text: String,
    /// Applied-operator record in original left-to-right order
    pub items: Vec<AppliedOperator>,
    /// Timestamp of the anonymization pass
    pub timestamp: DateTime<Utc>,
    /// Number of replacements per entity type
    pub stats_by_type: HashMap<String, usize>,
}

impl AnonymizeResult {
    /// Create a new result, computing per-type statistics from the record
    pub fn new(text: String, items: Vec<AppliedOperator>) -> Self {
        let mut stats_by_type = HashMap::new();
        for item in &items {
            *stats_by_type.entry(item.entity_type.clone()).or_insert(0) += 1;
        }

        Self {
            text,
            items,
            timestamp: Utc::now(),
            stats_by_type,
        }
    }

    /// Total number of replacements
    pub fn total_items(&self) -> usize {
        self.items.len()
    }

    /// Whether any span was replaced
    pub fn has_items(&self) -> bool {
        !self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_length() {
        let span = EntitySpan::new("PERSON", 5, 16, 0.85, "Mario Rossi");
        assert_eq!(span.len(), 11);
        assert!(!span.is_empty());
    }

    #[test]
    fn test_span_score_clamped() {
        let span = EntitySpan::new("PERSON", 0, 4, 1.7, "Anna");
        assert_eq!(span.score, 1.0);
    }

    #[test]
    fn test_result_stats() {
        let items = vec![
            AppliedOperator {
                entity_type: "PERSON".to_string(),
                start: 0,
                end: 10,
                operator: "entity_counter".to_string(),
                text: "<PERSON_0>".to_string(),
            },
            AppliedOperator {
                entity_type: "PERSON".to_string(),
                start: 15,
                end: 25,
                operator: "entity_counter".to_string(),
                text: "<PERSON_1>".to_string(),
            },
            AppliedOperator {
                entity_type: "LOCATION".to_string(),
                start: 30,
                end: 42,
                operator: "entity_counter".to_string(),
                text: "<LOCATION_0>".to_string(),
            },
        ];

        let result = AnonymizeResult::new("anonymized".to_string(), items);
        assert_eq!(result.total_items(), 3);
        assert_eq!(result.stats_by_type["PERSON"], 2);
        assert_eq!(result.stats_by_type["LOCATION"], 1);
        assert!(result.has_items());
    }
}
