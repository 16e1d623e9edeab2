//! Construction-time resolver configuration.
//!
//! # Invariants
//! - Configuration is passed explicitly to each resolver; there is no
//!   process-wide policy flag.
//! - Missing fields deserialize to their defaults.

use crate::repo::document_repo::SLUGS_FIELD;
use serde::{Deserialize, Serialize};

/// Resolver behavior toggles supplied by the embedding application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// When `false`, missing matches are dropped and the partial set returned.
    pub raise_not_found: bool,
    /// Multi-valued field holding document slugs.
    pub slug_field: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            raise_not_found: true,
            slug_field: SLUGS_FIELD.to_string(),
        }
    }
}

impl ResolverConfig {
    /// Default configuration with the not-found policy disabled.
    pub fn lenient() -> Self {
        Self {
            raise_not_found: false,
            ..Self::default()
        }
    }

    pub fn with_raise_not_found(mut self, raise_not_found: bool) -> Self {
        self.raise_not_found = raise_not_found;
        self
    }

    pub fn with_slug_field(mut self, slug_field: impl Into<String>) -> Self {
        self.slug_field = slug_field.into();
        self
    }
}
