//! InstanceCounter operator pair
//!
//! Assigns a shared, human-stable `<TYPE_n>` token per distinct original
//! value within an entity type, backed by the session's
//! [`EntityMappingStore`]. The inverse looks the original back up through
//! the store's reverse index.

use crate::domain::Result;
use crate::mapping::EntityMappingStore;

/// Replace a span's text with its per-type counter token, minting one in
/// first-seen order if the value is new this session.
pub(crate) fn apply(
    text: &str,
    entity_type: &str,
    store: &mut EntityMappingStore,
) -> Result<String> {
    Ok(store.token_for(entity_type, text))
}

/// Resolve a counter token back to the original value.
///
/// Fails with `UnknownEntityType` when the store has no table for the
/// type, or `UnknownToken` when the token was never minted in this
/// session.
pub(crate) fn invert(
    token: &str,
    entity_type: &str,
    store: &EntityMappingStore,
) -> Result<String> {
    store.original_for(entity_type, token).map(str::to_string)
}
