//! Entity detection boundary
//!
//! Span detection is an external collaborator: an NER/PII engine produces
//! [`EntitySpan`]s from raw text and this crate consumes them. The trait
//! below is the whole contract; model loading, language pipelines, and
//! overlap resolution all live behind it.

use crate::domain::{EntitySpan, Result};

/// Trait for entity span detection implementations
///
/// Implementations must return spans sorted ascending by `start` and
/// non-overlapping; the anonymization engine rejects anything else.
pub trait EntityDetector: Send + Sync {
    /// Detect entity spans in `text` for the given language code
    fn analyze(&self, text: &str, language: &str) -> Result<Vec<EntitySpan>>;
}
