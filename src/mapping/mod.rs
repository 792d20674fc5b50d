//! Session-scoped entity mapping store
//!
//! The store is the reversible state behind counter-style operators: for
//! each entity type it keeps a bijective table between original values and
//! replacement tokens, plus a reverse index maintained on every insert so
//! inverse lookups never scan.
//!
//! # Ownership
//!
//! One store per logical session (one document or one conversation). The
//! store is owned by the caller and passed explicitly into every
//! anonymize/deanonymize/reconcile call - never global, never implicit. If
//! a host application shares one store across documents for consistent
//! cross-document tokens, it must serialize those calls itself; the store
//! performs no internal locking.

use crate::domain::{CloakError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Nested original -> token mapping, keyed by entity type. This is the
/// caller-facing persistence shape; no file format is defined here.
pub type MappingSnapshot = HashMap<String, HashMap<String, String>>;

/// Format a replacement token for an entity type and counter index.
pub(crate) fn format_token(entity_type: &str, index: usize) -> String {
    format!("<{entity_type}_{index}>")
}

/// Extract the counter index from an engine-minted `<TYPE_n>` token.
///
/// The index is parsed from the last underscore, so entity-type names that
/// themselves contain underscores (`IT_FISCAL_CODE`) stay unambiguous.
///
/// # Panics
///
/// Panics on a malformed token. Tokens inside the store are always exact
/// echoes of engine output, so a malformed one indicates internal
/// corruption, not caller error.
pub(crate) fn parse_token_index(token: &str) -> usize {
    let inner = token
        .strip_prefix('<')
        .and_then(|t| t.strip_suffix('>'))
        .unwrap_or_else(|| panic!("malformed token in mapping store: '{token}'"));
    let (_, index) = inner
        .rsplit_once('_')
        .unwrap_or_else(|| panic!("token missing index delimiter: '{token}'"));
    index
        .parse()
        .unwrap_or_else(|_| panic!("token index is not a number: '{token}'"))
}

/// Session-scoped bijective table between original values and tokens,
/// per entity type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityMappingStore {
    /// Session identifier, carried into audit logs
    session_id: Uuid,
    /// entity type -> original value -> token
    forward: MappingSnapshot,
    /// entity type -> token -> original value (maintained on insert)
    reverse: MappingSnapshot,
}

impl EntityMappingStore {
    /// Create an empty store for a new session
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            forward: HashMap::new(),
            reverse: HashMap::new(),
        }
    }

    /// Session identifier for this store
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Return the token for `text` under `entity_type`, minting a new one
    /// in first-seen order if the value has not been seen this session.
    ///
    /// Idempotent: re-anonymizing the same literal value within the same
    /// entity type always yields the same token. New tokens use index
    /// `max(existing indices) + 1`, starting at zero.
    pub fn token_for(&mut self, entity_type: &str, text: &str) -> String {
        if let Some(token) = self.forward.get(entity_type).and_then(|m| m.get(text)) {
            return token.clone();
        }

        let index = match self.reverse.get(entity_type) {
            None => 0,
            Some(tokens) => tokens
                .keys()
                .map(|t| parse_token_index(t))
                .max()
                .map_or(0, |max| max + 1),
        };

        let token = format_token(entity_type, index);
        self.forward
            .entry(entity_type.to_string())
            .or_default()
            .insert(text.to_string(), token.clone());
        self.reverse
            .entry(entity_type.to_string())
            .or_default()
            .insert(token.clone(), text.to_string());

        tracing::debug!(
            entity_type,
            token = %token,
            session_id = %self.session_id,
            "Minted mapping token"
        );

        token
    }

    /// Look up the original value for a token produced by this store.
    ///
    /// # Errors
    ///
    /// - [`CloakError::UnknownEntityType`] if `entity_type` has no table
    /// - [`CloakError::UnknownToken`] if the token was never minted for it
    pub fn original_for(&self, entity_type: &str, token: &str) -> Result<&str> {
        let tokens = self
            .reverse
            .get(entity_type)
            .ok_or_else(|| CloakError::UnknownEntityType(entity_type.to_string()))?;

        tokens
            .get(token)
            .map(String::as_str)
            .ok_or_else(|| CloakError::UnknownToken {
                entity_type: entity_type.to_string(),
                token: token.to_string(),
            })
    }

    /// Whether the store has a table for `entity_type`
    pub fn contains_type(&self, entity_type: &str) -> bool {
        self.forward.contains_key(entity_type)
    }

    /// Number of mapped values under `entity_type`
    pub fn type_len(&self, entity_type: &str) -> usize {
        self.forward.get(entity_type).map_or(0, HashMap::len)
    }

    /// Total number of mapped values across all entity types
    pub fn len(&self) -> usize {
        self.forward.values().map(HashMap::len).sum()
    }

    /// Whether the store holds no mappings
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clone of the nested original -> token mapping, for persistence,
    /// audit, or reconciliation (which must not mutate the live store).
    pub fn snapshot(&self) -> MappingSnapshot {
        self.forward.clone()
    }

    /// Rebuild a store from a previously persisted snapshot, validating the
    /// per-type bijection and reconstructing the reverse index.
    ///
    /// # Errors
    ///
    /// Returns [`CloakError::Serialization`] if two originals map to the
    /// same token within one entity type.
    pub fn from_snapshot(snapshot: MappingSnapshot) -> Result<Self> {
        let mut reverse: MappingSnapshot = HashMap::new();

        for (entity_type, mappings) in &snapshot {
            let back = reverse.entry(entity_type.clone()).or_default();
            for (original, token) in mappings {
                if let Some(previous) = back.insert(token.clone(), original.clone()) {
                    return Err(CloakError::Serialization(format!(
                        "token '{token}' maps to both '{previous}' and '{original}' \
                         under entity type '{entity_type}'"
                    )));
                }
            }
        }

        Ok(Self {
            session_id: Uuid::new_v4(),
            forward: snapshot,
            reverse,
        })
    }
}

impl Default for EntityMappingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_token_is_zero_indexed() {
        let mut store = EntityMappingStore::new();
        assert_eq!(store.token_for("PERSON", "Mario Rossi"), "<PERSON_0>");
    }

    #[test]
    fn test_counter_increments_in_first_seen_order() {
        let mut store = EntityMappingStore::new();
        assert_eq!(store.token_for("PERSON", "Mario Rossi"), "<PERSON_0>");
        assert_eq!(store.token_for("PERSON", "Anna Bianchi"), "<PERSON_1>");
        assert_eq!(store.token_for("PERSON", "Luca Verdi"), "<PERSON_2>");
    }

    #[test]
    fn test_idempotent_assignment() {
        let mut store = EntityMappingStore::new();
        let first = store.token_for("PERSON", "Mario Rossi");
        let second = store.token_for("PERSON", "Mario Rossi");
        assert_eq!(first, second);
        assert_eq!(store.type_len("PERSON"), 1);
    }

    #[test]
    fn test_counters_are_per_type() {
        let mut store = EntityMappingStore::new();
        assert_eq!(store.token_for("PERSON", "Mario Rossi"), "<PERSON_0>");
        assert_eq!(store.token_for("LOCATION", "Roma"), "<LOCATION_0>");
        assert_eq!(store.token_for("LOCATION", "Milano"), "<LOCATION_1>");
    }

    #[test]
    fn test_bijection() {
        let mut store = EntityMappingStore::new();
        let token_a = store.token_for("PERSON", "Mario Rossi");
        let token_b = store.token_for("PERSON", "Anna Bianchi");

        assert_ne!(token_a, token_b);
        assert_eq!(store.original_for("PERSON", &token_a).unwrap(), "Mario Rossi");
        assert_eq!(store.original_for("PERSON", &token_b).unwrap(), "Anna Bianchi");
    }

    #[test]
    fn test_unknown_entity_type() {
        let store = EntityMappingStore::new();
        let err = store.original_for("PERSON", "<PERSON_0>").unwrap_err();
        assert!(matches!(err, CloakError::UnknownEntityType(_)));
    }

    #[test]
    fn test_unknown_token() {
        let mut store = EntityMappingStore::new();
        store.token_for("PERSON", "Mario Rossi");

        let err = store.original_for("PERSON", "<PERSON_9>").unwrap_err();
        assert!(matches!(err, CloakError::UnknownToken { .. }));
    }

    #[test]
    fn test_underscore_in_entity_type() {
        let mut store = EntityMappingStore::new();
        let token = store.token_for("IT_FISCAL_CODE", "RSSMRA85M01H501Z");
        assert_eq!(token, "<IT_FISCAL_CODE_0>");
        assert_eq!(parse_token_index(&token), 0);

        let next = store.token_for("IT_FISCAL_CODE", "BNCNNA90A41F205X");
        assert_eq!(next, "<IT_FISCAL_CODE_1>");
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let mut store = EntityMappingStore::new();
        store.token_for("PERSON", "Mario Rossi");
        store.token_for("PERSON", "Anna Bianchi");
        store.token_for("LOCATION", "Roma");

        let restored = EntityMappingStore::from_snapshot(store.snapshot()).unwrap();
        assert_eq!(restored.len(), 3);
        assert_eq!(
            restored.original_for("PERSON", "<PERSON_1>").unwrap(),
            "Anna Bianchi"
        );
    }

    #[test]
    fn test_restored_store_continues_counter() {
        let mut store = EntityMappingStore::new();
        store.token_for("PERSON", "Mario Rossi");
        store.token_for("PERSON", "Anna Bianchi");

        let mut restored = EntityMappingStore::from_snapshot(store.snapshot()).unwrap();
        assert_eq!(restored.token_for("PERSON", "Luca Verdi"), "<PERSON_2>");
    }

    #[test]
    fn test_from_snapshot_rejects_duplicate_tokens() {
        let mut snapshot: MappingSnapshot = HashMap::new();
        let mut persons = HashMap::new();
        persons.insert("Mario Rossi".to_string(), "<PERSON_0>".to_string());
        persons.insert("Anna Bianchi".to_string(), "<PERSON_0>".to_string());
        snapshot.insert("PERSON".to_string(), persons);

        let err = EntityMappingStore::from_snapshot(snapshot).unwrap_err();
        assert!(matches!(err, CloakError::Serialization(_)));
    }

    #[test]
    #[should_panic(expected = "malformed token")]
    fn test_malformed_token_is_fatal() {
        parse_token_index("PERSON_0");
    }
}
