//! Stored document read model.
//!
//! # Responsibility
//! - Define the record returned by store lookups.
//! - Expose the slug set used by completeness checks.
//!
//! # Invariants
//! - `id` is the canonical primary-key string and is never empty.
//! - `slugs` keeps insertion order; the first entry is the current slug and
//!   later entries are historical aliases.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Validation failures for documents before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentValidationError {
    EmptyId,
    EmptyCollection,
    BlankSlug,
}

impl Display for DocumentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "document id cannot be empty"),
            Self::EmptyCollection => write!(f, "document collection cannot be empty"),
            Self::BlankSlug => write!(f, "document slugs cannot be blank"),
        }
    }
}

impl Error for DocumentValidationError {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub collection: String,
    pub id: String,
    /// Current slug first, followed by historical aliases.
    #[serde(rename = "_slugs")]
    pub slugs: Vec<String>,
    #[serde(default)]
    pub body: Value,
}

impl Document {
    /// Creates a document with no slugs and an empty object body.
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
            slugs: Vec::new(),
            body: Value::Object(Default::default()),
        }
    }

    pub fn with_slugs<I, S>(mut self, slugs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.slugs = slugs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    /// Returns the current (first) slug.
    pub fn slug(&self) -> Option<&str> {
        self.slugs.first().map(String::as_str)
    }

    pub fn has_slug(&self, slug: &str) -> bool {
        self.slugs.iter().any(|value| value == slug)
    }

    pub fn validate(&self) -> Result<(), DocumentValidationError> {
        if self.collection.trim().is_empty() {
            return Err(DocumentValidationError::EmptyCollection);
        }
        if self.id.is_empty() {
            return Err(DocumentValidationError::EmptyId);
        }
        if self.slugs.iter().any(|slug| slug.trim().is_empty()) {
            return Err(DocumentValidationError::BlankSlug);
        }
        Ok(())
    }
}
