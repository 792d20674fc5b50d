// Cloak - Reversible Text Anonymization Engine
// Copyright (c) 2025 Cloak Contributors
// Licensed under the MIT License

//! # Cloak - Reversible Text Anonymization
//!
//! Cloak replaces personally-identifiable spans inside free text with
//! replacement tokens and, given the right secret material, reverses the
//! transformation to recover the original values. Span *detection* is an
//! external collaborator (see [`detector`]); this crate owns everything
//! after detection.
//!
//! ## Architecture
//!
//! - [`operators`] - Pluggable reversible transforms (encrypt/decrypt,
//!   instance counter) plus registry and per-type assignment
//! - [`mapping`] - Session-scoped bijective store between original values
//!   and `<TYPE_n>` tokens
//! - [`engine`] - Anonymization (right-to-left replacement over detected
//!   spans) and deanonymization (record-driven inversion)
//! - [`reconcile`] - Two-phase validator that rewrites anonymized
//!   structured payloads back to original values before strict validation
//! - [`domain`] - Shared models and the [`CloakError`](domain::CloakError)
//!   taxonomy
//! - [`config`] / [`logging`] / [`audit`] - Detector parametrization,
//!   structured logging, and hashed audit trails
//!
//! ## Quick Start
//!
//! ```rust
//! use cloak::domain::EntitySpan;
//! use cloak::engine::{AnonymizerEngine, DeanonymizerEngine};
//! use cloak::mapping::EntityMappingStore;
//! use cloak::operators::{OperatorAssignment, OperatorConfig};
//!
//! # fn main() -> cloak::domain::Result<()> {
//! // One store per session, owned by the caller.
//! let mut store = EntityMappingStore::new();
//! let assignment = OperatorAssignment::with_default(OperatorConfig::entity_counter());
//!
//! let text = "Mario Rossi lives in Rome";
//! let spans = vec![
//!     EntitySpan::new("PERSON", 0, 11, 0.9, "Mario Rossi"),
//!     EntitySpan::new("LOCATION", 21, 25, 0.8, "Rome"),
//! ];
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
//!
//! ## Encryption
//!
//! Spans can be encrypted instead of counted: assign
//! [`OperatorConfig::encrypt`](operators::OperatorConfig::encrypt) with a
//! 16-, 24-, or 32-byte key and deanonymize with the same key. The key is
//! an opaque secret supplied by the caller; Cloak never generates or
//! stores keys.
//!
//! ## Error Handling
//!
//! All fallible operations return [`domain::Result`] with the
//! [`domain::CloakError`] taxonomy; the reconciliation validator is the
//! one deliberate exception, degrading to an empty result plus a logged
//! failure (see [`reconcile`]).

pub mod audit;
pub mod config;
pub mod detector;
pub mod domain;
pub mod engine;
pub mod logging;
pub mod mapping;
pub mod operators;
pub mod reconcile;
