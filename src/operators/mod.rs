//! Operator framework
//!
//! Operators are named, reversible transforms applied to a span's text.
//! The operator set is small and fixed, so it is modeled as a closed
//! tagged variant ([`BuiltinOperator`]) dispatched through one interface;
//! the [`OperatorRegistry`] keeps a name -> variant table so that stable
//! operator names in an [`AppliedOperator`](crate::domain::AppliedOperator)
//! record resolve back to an implementation, and stays open for future
//! registration.
//!
//! Operators are selected per entity type through an
//! [`OperatorAssignment`]; the `DEFAULT` sentinel entry covers types with
//! no explicit assignment.

pub mod counter;
pub mod encrypt;

use crate::domain::{CloakError, Result};
use crate::mapping::EntityMappingStore;
use secrecy::SecretString;
use std::collections::HashMap;

/// Sentinel entity type matched when no explicit assignment exists
pub const DEFAULT_ENTITY: &str = "DEFAULT";

/// The built-in operator set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinOperator {
    /// Symmetric keyed encryption of the span text to an opaque token
    Encrypt,
    /// Inverse of [`Self::Encrypt`] under the same key
    Decrypt,
    /// Per-type counter token shared by identical values in one session
    InstanceCounter,
    /// Reverse lookup of a counter token through the mapping store
    InstanceCounterInverse,
}

impl BuiltinOperator {
    /// Stable identifier used in applied-operator records
    pub fn name(&self) -> &'static str {
        match self {
            Self::Encrypt => "encrypt",
            Self::Decrypt => "decrypt",
            Self::InstanceCounter => "entity_counter",
            Self::InstanceCounterInverse => "entity_counter_inverse",
        }
    }

    /// The operator that undoes this one
    pub fn inverse(&self) -> Self {
        match self {
            Self::Encrypt => Self::Decrypt,
            Self::Decrypt => Self::Encrypt,
            Self::InstanceCounter => Self::InstanceCounterInverse,
            Self::InstanceCounterInverse => Self::InstanceCounter,
        }
    }

    /// Check that required parameters are present and well-formed.
    ///
    /// # Errors
    ///
    /// - [`CloakError::Params`] when encrypt/decrypt is missing its key
    /// - [`CloakError::InvalidKey`] when the key has an unsupported length
    pub fn validate_params(&self, params: &OperatorParams) -> Result<()> {
        match self {
            Self::Encrypt | Self::Decrypt => {
                let key = params.key.as_ref().ok_or_else(|| {
                    CloakError::Params(format!(
                        "operator '{}' requires a 'key' parameter",
                        self.name()
                    ))
                })?;
                encrypt::validate_key(key)
            }
            Self::InstanceCounter | Self::InstanceCounterInverse => Ok(()),
        }
    }

    /// Apply the operator to a span's text.
    ///
    /// Counter-style operators read and write the session store; the
    /// encryption pair leaves it untouched.
    pub fn apply(&self, text: &str, ctx: &mut OperatorContext<'_>) -> Result<String> {
        self.validate_params(ctx.params)?;

        match self {
            Self::Encrypt => encrypt::encrypt_value(ctx.require_key()?, text),
            Self::Decrypt => encrypt::decrypt_value(ctx.require_key()?, text),
            Self::InstanceCounter => counter::apply(text, ctx.entity_type, ctx.store),
            Self::InstanceCounterInverse => counter::invert(text, ctx.entity_type, ctx.store),
        }
    }
}

/// Invocation context handed to an operator by the engine
pub struct OperatorContext<'a> {
    /// Entity type of the span being transformed
    pub entity_type: &'a str,
    /// Session mapping store, owned by the caller
    pub store: &'a mut EntityMappingStore,
    /// Parameters from the resolved operator configuration
    pub params: &'a OperatorParams,
}

impl OperatorContext<'_> {
    fn require_key(&self) -> Result<&SecretString> {
        self.params
            .key
            .as_ref()
            .ok_or_else(|| CloakError::Params("missing 'key' parameter".to_string()))
    }
}

/// Parameters attached to an operator configuration.
///
/// The encryption key rides in a [`SecretString`] so it is redacted from
/// debug output and zeroed on drop; this crate never generates or stores
/// keys itself.
#[derive(Clone, Default)]
pub struct OperatorParams {
    /// Symmetric key for the encrypt/decrypt operators
    pub key: Option<SecretString>,
}

impl OperatorParams {
    /// Empty parameter set
    pub fn none() -> Self {
        Self::default()
    }

    /// Parameter set carrying an encryption key
    pub fn with_key(key: SecretString) -> Self {
        Self { key: Some(key) }
    }
}

impl std::fmt::Debug for OperatorParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorParams")
            .field("key", &self.key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// A named operator plus its parameters, assigned to an entity type
#[derive(Debug, Clone)]
pub struct OperatorConfig {
    /// Stable operator name, resolved through the registry
    pub operator_name: String,
    /// Operator parameters
    pub params: OperatorParams,
}

impl OperatorConfig {
    /// Configuration for the encrypt operator
    pub fn encrypt(key: SecretString) -> Self {
        Self {
            operator_name: BuiltinOperator::Encrypt.name().to_string(),
            params: OperatorParams::with_key(key),
        }
    }

    /// Configuration for the decrypt operator
    pub fn decrypt(key: SecretString) -> Self {
        Self {
            operator_name: BuiltinOperator::Decrypt.name().to_string(),
            params: OperatorParams::with_key(key),
        }
    }

    /// Configuration for the instance counter operator
    pub fn entity_counter() -> Self {
        Self {
            operator_name: BuiltinOperator::InstanceCounter.name().to_string(),
            params: OperatorParams::none(),
        }
    }

    /// Configuration for the instance counter inverse operator
    pub fn entity_counter_inverse() -> Self {
        Self {
            operator_name: BuiltinOperator::InstanceCounterInverse.name().to_string(),
            params: OperatorParams::none(),
        }
    }
}

/// Mapping from entity type (or the `DEFAULT` sentinel) to an operator
/// configuration, resolved once per anonymize/deanonymize call.
#[derive(Debug, Clone, Default)]
pub struct OperatorAssignment {
    entries: HashMap<String, OperatorConfig>,
}

impl OperatorAssignment {
    /// Empty assignment (every resolution fails until entries are added)
    pub fn new() -> Self {
        Self::default()
    }

    /// Assignment with only a `DEFAULT` entry
    pub fn with_default(config: OperatorConfig) -> Self {
        let mut assignment = Self::new();
        assignment.set_default(config);
        assignment
    }

    /// Assign an operator to a specific entity type
    pub fn insert(&mut self, entity_type: impl Into<String>, config: OperatorConfig) {
        self.entries.insert(entity_type.into(), config);
    }

    /// Builder-style variant of [`Self::insert`]
    pub fn with(mut self, entity_type: impl Into<String>, config: OperatorConfig) -> Self {
        self.insert(entity_type, config);
        self
    }

    /// Set the `DEFAULT` entry used when a type has no explicit assignment
    pub fn set_default(&mut self, config: OperatorConfig) {
        self.entries.insert(DEFAULT_ENTITY.to_string(), config);
    }

    /// Resolve the configuration for an entity type: exact entry first,
    /// then `DEFAULT`.
    ///
    /// # Errors
    ///
    /// [`CloakError::UnassignedOperator`] when neither exists.
    pub fn resolve(&self, entity_type: &str) -> Result<&OperatorConfig> {
        self.entries
            .get(entity_type)
            .or_else(|| self.entries.get(DEFAULT_ENTITY))
            .ok_or_else(|| CloakError::UnassignedOperator {
                entity_type: entity_type.to_string(),
            })
    }
}

/// Table of stable operator names to implementations, seeded with the
/// four built-ins.
#[derive(Debug, Clone)]
pub struct OperatorRegistry {
    operators: HashMap<String, BuiltinOperator>,
}

impl OperatorRegistry {
    /// Registry containing the built-in operator set
    pub fn with_builtins() -> Self {
        let mut operators = HashMap::new();
        for op in [
            BuiltinOperator::Encrypt,
            BuiltinOperator::Decrypt,
            BuiltinOperator::InstanceCounter,
            BuiltinOperator::InstanceCounterInverse,
        ] {
            operators.insert(op.name().to_string(), op);
        }
        Self { operators }
    }

    /// Register an additional name for an operator variant
    pub fn register(&mut self, name: impl Into<String>, op: BuiltinOperator) {
        self.operators.insert(name.into(), op);
    }

    /// Resolve an operator by its stable name.
    ///
    /// # Errors
    ///
    /// [`CloakError::Params`] for a name the registry does not know.
    pub fn resolve(&self, name: &str) -> Result<BuiltinOperator> {
        self.operators
            .get(name)
            .copied()
            .ok_or_else(|| CloakError::Params(format!("unknown operator '{name}'")))
    }
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
