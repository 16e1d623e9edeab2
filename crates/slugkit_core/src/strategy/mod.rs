//! Slug strategy contracts and per-collection memoization.
//!
//! # Responsibility
//! - Define the "does this string look like a primary key?" predicate.
//! - Define the provider seam that selects a predicate for a key type.
//! - Memoize the selected predicate once per collection context.
//!
//! # Invariants
//! - Strategy predicates are pure and thread-safe.
//! - A cache resolves its strategy at most once, even under concurrent first use.

mod registry;

pub use registry::{never_key_like, StrategyRegistry};

use crate::schema::KeyTypeDescriptor;
use log::debug;
use once_cell::sync::OnceCell;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Predicate answering whether a string looks like a primary key (not a slug).
pub type SlugStrategy = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Selects the slug strategy for a key-type descriptor.
pub trait StrategyProvider: Send + Sync {
    /// Returns the predicate and whether it came from an explicit override.
    fn strategy_for(&self, key_type: &KeyTypeDescriptor) -> (SlugStrategy, bool);
}

impl<T: StrategyProvider + ?Sized> StrategyProvider for Arc<T> {
    fn strategy_for(&self, key_type: &KeyTypeDescriptor) -> (SlugStrategy, bool) {
        (**self).strategy_for(key_type)
    }
}

/// Strategy selected for one collection.
#[derive(Clone)]
pub struct ResolvedStrategy {
    pub predicate: SlugStrategy,
    pub overridden: bool,
}

impl ResolvedStrategy {
    pub fn looks_like_key(&self, value: &str) -> bool {
        (self.predicate)(value)
    }
}

impl Debug for ResolvedStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedStrategy")
            .field("overridden", &self.overridden)
            .finish_non_exhaustive()
    }
}

/// Lazily-initialized strategy memo owned by a collection context.
#[derive(Debug, Default)]
pub struct StrategyCache {
    resolved: OnceCell<ResolvedStrategy>,
}

impl StrategyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the memoized strategy, asking `provider` only on first use.
    pub fn get_or_resolve(
        &self,
        key_type: &KeyTypeDescriptor,
        provider: &dyn StrategyProvider,
    ) -> &ResolvedStrategy {
        self.resolved.get_or_init(|| {
            let (predicate, overridden) = provider.strategy_for(key_type);
            debug!(
                "event=strategy_resolve module=strategy status=ok key_type={} overridden={}",
                key_type.kind, overridden
            );
            ResolvedStrategy {
                predicate,
                overridden,
            }
        })
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }
}
