//! Batch classification: primary keys versus slugs.
//!
//! # Invariants
//! - A batch is classified as a whole; one key-like value sends the entire
//!   batch down the key path.
//! - Any non-string identifier means the batch holds typed keys.
//! - The strategy is obtained through the collection's cache, so the
//!   provider is consulted at most once per collection.

use crate::model::identifier::Identifier;
use crate::schema::KeyTypeDescriptor;
use crate::strategy::{StrategyCache, StrategyProvider};

/// Returns whether `identifiers` should be resolved through the slug field.
///
/// An empty batch carries no slug evidence and returns `false`.
pub fn looks_like_slugs(
    identifiers: &[Identifier],
    key_type: &KeyTypeDescriptor,
    cache: &StrategyCache,
    provider: &dyn StrategyProvider,
) -> bool {
    if identifiers.is_empty() {
        return false;
    }

    let mut texts = Vec::with_capacity(identifiers.len());
    for identifier in identifiers {
        match identifier.as_text() {
            Some(text) => texts.push(text),
            None => return false,
        }
    }

    let strategy = cache.get_or_resolve(key_type, provider);
    !texts.iter().any(|text| strategy.looks_like_key(text))
}
