//! Collection schema descriptors.
//!
//! # Responsibility
//! - Describe a collection's primary-key type and optional slug strategy.
//! - Map key-type tags to and from their persisted names.
//!
//! # Invariants
//! - Descriptors are immutable once built; resolvers only read them.
//! - Custom key-type names are non-empty and lowercase.

use crate::strategy::SlugStrategy;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

const CUSTOM_PREFIX: &str = "custom:";

/// Schema construction/parsing errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    EmptyCollectionName,
    UnknownKeyType(String),
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCollectionName => write!(f, "collection name cannot be empty"),
            Self::UnknownKeyType(value) => write!(f, "unknown key type `{value}`"),
        }
    }
}

impl Error for SchemaError {}

/// Declared type of a collection's primary-key field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyType {
    ObjectId,
    String,
    Uuid,
    Integer,
    /// Application-defined key type, identified by name.
    Custom(String),
}

impl KeyType {
    /// Builds a custom key type with a normalized name.
    pub fn custom(name: &str) -> Result<Self, SchemaError> {
        let normalized = name.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(SchemaError::UnknownKeyType(name.to_string()));
        }
        Ok(Self::Custom(normalized))
    }

    /// Persisted tag for this key type.
    pub fn as_tag(&self) -> String {
        match self {
            Self::ObjectId => "object_id".to_string(),
            Self::String => "string".to_string(),
            Self::Uuid => "uuid".to_string(),
            Self::Integer => "integer".to_string(),
            Self::Custom(name) => format!("{CUSTOM_PREFIX}{name}"),
        }
    }

    /// Parses a persisted tag produced by [`KeyType::as_tag`].
    pub fn parse_tag(value: &str) -> Result<Self, SchemaError> {
        match value {
            "object_id" => Ok(Self::ObjectId),
            "string" => Ok(Self::String),
            "uuid" => Ok(Self::Uuid),
            "integer" => Ok(Self::Integer),
            other => match other.strip_prefix(CUSTOM_PREFIX) {
                Some(name) => Self::custom(name),
                None => Err(SchemaError::UnknownKeyType(other.to_string())),
            },
        }
    }
}

impl Display for KeyType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_tag())
    }
}

/// Primary-key metadata consumed by slug classification.
#[derive(Clone)]
pub struct KeyTypeDescriptor {
    pub kind: KeyType,
    /// Explicit override; wins over the built-in strategy for `kind`.
    pub strategy: Option<SlugStrategy>,
}

impl KeyTypeDescriptor {
    pub fn new(kind: KeyType) -> Self {
        Self {
            kind,
            strategy: None,
        }
    }

    pub fn with_strategy(kind: KeyType, strategy: SlugStrategy) -> Self {
        Self {
            kind,
            strategy: Some(strategy),
        }
    }

    pub fn has_override(&self) -> bool {
        self.strategy.is_some()
    }
}

impl Debug for KeyTypeDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyTypeDescriptor")
            .field("kind", &self.kind)
            .field("has_override", &self.has_override())
            .finish()
    }
}

/// Schema of one document collection.
#[derive(Debug, Clone)]
pub struct CollectionSchema {
    name: String,
    key: KeyTypeDescriptor,
}

impl CollectionSchema {
    pub fn new(name: impl Into<String>, key: KeyTypeDescriptor) -> Result<Self, SchemaError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(SchemaError::EmptyCollectionName);
        }
        Ok(Self { name, key })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &KeyTypeDescriptor {
        &self.key
    }
}

#[cfg(test)]
mod tests {
    use super::{CollectionSchema, KeyType, KeyTypeDescriptor, SchemaError};
    use std::sync::Arc;

    #[test]
    fn key_type_tags_roundtrip_including_custom() {
        for kind in [
            KeyType::ObjectId,
            KeyType::String,
            KeyType::Uuid,
            KeyType::Integer,
            KeyType::custom(" Snowflake ").unwrap(),
        ] {
            assert_eq!(KeyType::parse_tag(&kind.as_tag()).unwrap(), kind);
        }
        assert_eq!(
            KeyType::custom("Snowflake").unwrap().as_tag(),
            "custom:snowflake"
        );
    }

    #[test]
    fn unknown_tags_are_rejected() {
        assert_eq!(
            KeyType::parse_tag("binary"),
            Err(SchemaError::UnknownKeyType("binary".to_string()))
        );
        assert!(KeyType::parse_tag("custom:").is_err());
    }

    #[test]
    fn schema_requires_name() {
        let err = CollectionSchema::new("  ", KeyTypeDescriptor::new(KeyType::String)).unwrap_err();
        assert_eq!(err, SchemaError::EmptyCollectionName);
    }

    #[test]
    fn descriptor_debug_hides_strategy_closure() {
        let descriptor =
            KeyTypeDescriptor::with_strategy(KeyType::String, Arc::new(|value: &str| value.len() > 3));
        let rendered = format!("{descriptor:?}");
        assert!(rendered.contains("has_override: true"));
    }
}
