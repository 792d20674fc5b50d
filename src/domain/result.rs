//! Result type alias for Cloak

use super::errors::CloakError;

/// Crate-wide result type carrying [`CloakError`]
pub type Result<T> = std::result::Result<T, CloakError>;
