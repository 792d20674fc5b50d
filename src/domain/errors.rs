//! Domain error types
//!
//! This module defines the error hierarchy for Cloak. All errors are
//! domain-specific and don't expose third-party types.

use thiserror::Error;

/// Phase of the structured reconciliation validator in which a schema
/// check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationPhase {
    /// Permissive validation of the raw payload, before reconciliation.
    Pre,
    /// Strict validation of the reconciled payload.
    Post,
}

impl std::fmt::Display for ValidationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pre => write!(f, "pre"),
            Self::Post => write!(f, "post"),
        }
    }
}

/// Main Cloak error type
///
/// This is the primary error type used throughout the crate. Every failure
/// surfaced by the engine, the mapping store, the operators, or the
/// reconciliation validator maps to exactly one variant.
#[derive(Debug, Error)]
pub enum CloakError {
    /// Operator misconfiguration (missing or malformed parameter)
    #[error("Operator parameter error: {0}")]
    Params(String),

    /// Encryption key of the wrong length or format
    #[error("Invalid encryption key: {0}")]
    InvalidKey(String),

    /// Cipher failure, including authentication failure when decrypting
    /// under the wrong key
    #[error("Cryptographic operation failed: {0}")]
    Crypto(String),

    /// No operator resolved for an entity type and no default entry exists
    #[error("No operator assigned for entity type '{entity_type}' and no default entry")]
    UnassignedOperator { entity_type: String },

    /// Span list is unsorted or contains overlapping spans
    #[error("Overlapping or unsorted spans: {0}")]
    OverlappingSpans(String),

    /// Span is out of bounds, empty, or not on a character boundary
    #[error("Invalid span: {0}")]
    InvalidSpan(String),

    /// Deanonymization lookup against an entity type absent from the store
    #[error("Unknown entity type in mapping store: {0}")]
    UnknownEntityType(String),

    /// Deanonymization lookup for a token the store never produced
    #[error("Unknown token '{token}' for entity type '{entity_type}'")]
    UnknownToken { entity_type: String, token: String },

    /// A recorded token could not be found verbatim in the anonymized text
    #[error("Reconciliation error: {0}")]
    Reconciliation(String),

    /// Schema validation failure in the reconciliation validator
    #[error("Validation failed in {phase} phase: {reason}")]
    Validation {
        phase: ValidationPhase,
        reason: String,
    },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for CloakError {
    fn from(err: std::io::Error) -> Self {
        CloakError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for CloakError {
    fn from(err: serde_json::Error) -> Self {
        CloakError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for CloakError {
    fn from(err: toml::de::Error) -> Self {
        CloakError::Configuration(format!("TOML parse error: {err}"))
    }
}
