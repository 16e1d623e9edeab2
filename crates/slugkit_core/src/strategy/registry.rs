//! Built-in strategy registry keyed by key-type tag.
//!
//! # Invariants
//! - An explicit override on the descriptor always wins.
//! - `object_id`: key-like iff the value is a legal object id string.
//! - `string`: every value is key-like, so slug lookup never auto-triggers.
//! - `uuid`: key-like iff the value parses as a UUID.
//! - Any unregistered type falls back to the registry default, which is
//!   "never key-like" unless replaced. This default is conservative: it
//!   enables slug lookup for key types nobody has described yet.

use super::{SlugStrategy, StrategyProvider};
use crate::model::identifier::ObjectId;
use crate::schema::{KeyType, KeyTypeDescriptor};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// Fallback predicate for key types without a registered strategy.
pub fn never_key_like() -> SlugStrategy {
    Arc::new(|_: &str| false)
}

/// Registry mapping key types to slug strategies.
#[derive(Clone)]
pub struct StrategyRegistry {
    strategies: BTreeMap<KeyType, SlugStrategy>,
    fallback: SlugStrategy,
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl StrategyRegistry {
    /// Registry with no entries; every lookup hits the fallback.
    pub fn empty() -> Self {
        Self {
            strategies: BTreeMap::new(),
            fallback: never_key_like(),
        }
    }

    /// Registry preloaded with `object_id`, `string` and `uuid` strategies.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(KeyType::ObjectId, Arc::new(ObjectId::is_legal));
        registry.register(KeyType::String, Arc::new(|_: &str| true));
        registry.register(
            KeyType::Uuid,
            Arc::new(|value: &str| Uuid::parse_str(value).is_ok()),
        );
        registry
    }

    /// Registers or replaces the strategy for one key type.
    pub fn register(&mut self, kind: KeyType, strategy: SlugStrategy) {
        self.strategies.insert(kind, strategy);
    }

    /// Replaces the fallback used for unregistered key types.
    pub fn set_fallback(&mut self, strategy: SlugStrategy) {
        self.fallback = strategy;
    }

    pub fn is_registered(&self, kind: &KeyType) -> bool {
        self.strategies.contains_key(kind)
    }

    /// Returns the registered strategy for `kind`, or the fallback.
    pub fn lookup(&self, kind: &KeyType) -> SlugStrategy {
        self.strategies
            .get(kind)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }
}

impl StrategyProvider for StrategyRegistry {
    fn strategy_for(&self, key_type: &KeyTypeDescriptor) -> (SlugStrategy, bool) {
        match key_type.strategy.as_ref() {
            Some(strategy) => (Arc::clone(strategy), true),
            None => (self.lookup(&key_type.kind), false),
        }
    }
}
