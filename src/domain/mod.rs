//! Domain models and types for Cloak.
//!
//! This module contains the core domain models shared across the crate:
//!
//! - **Entity models** ([`EntitySpan`], [`AppliedOperator`], [`AnonymizeResult`])
//! - **Error types** ([`CloakError`], [`ValidationPhase`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, CloakError>`]:
//!
//! ```rust
//! use cloak::domain::{CloakError, Result};
//!
//! fn example() -> Result<()> {
//!     Err(CloakError::UnknownEntityType("PERSON".to_string()))
//! }
//! assert!(example().is_err());
//! ```

pub mod entity;
pub mod errors;
pub mod result;

// Re-export commonly used types for convenience
pub use entity::{AnonymizeResult, AppliedOperator, EntitySpan};
pub use errors::{CloakError, ValidationPhase};
pub use result::Result;
