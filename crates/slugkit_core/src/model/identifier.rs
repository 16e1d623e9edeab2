//! Caller-supplied lookup identifiers.
//!
//! # Responsibility
//! - Represent the heterogeneous values callers pass to `find`.
//! - Provide object-id syntax checks shared by classification and parsing.
//!
//! # Invariants
//! - Only `Identifier::Text` is string-like; every other variant is a
//!   pre-parsed typed key.
//! - `ObjectId` text form is always 24 lowercase hex characters.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static OBJECT_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{24}$").expect("valid object id regex"));

const OBJECT_ID_LEN: usize = 12;

/// Parse failure for typed identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    IllegalObjectId(String),
}

impl Display for IdentifierError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IllegalObjectId(value) => write!(f, "illegal object id: `{value}`"),
        }
    }
}

impl Error for IdentifierError {}

/// 12-byte document-store object identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ObjectId([u8; OBJECT_ID_LEN]);

impl ObjectId {
    pub fn from_bytes(bytes: [u8; OBJECT_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Returns whether `value` is a syntactically legal object id string.
    pub fn is_legal(value: &str) -> bool {
        OBJECT_ID_RE.is_match(value)
    }

    /// Parses a 24-character hex string.
    pub fn parse_str(value: &str) -> Result<Self, IdentifierError> {
        if !Self::is_legal(value) {
            return Err(IdentifierError::IllegalObjectId(value.to_string()));
        }

        let mut bytes = [0_u8; OBJECT_ID_LEN];
        for (index, byte) in bytes.iter_mut().enumerate() {
            let pair = &value[index * 2..index * 2 + 2];
            *byte = u8::from_str_radix(pair, 16)
                .map_err(|_| IdentifierError::IllegalObjectId(value.to_string()))?;
        }
        Ok(Self(bytes))
    }

    pub fn bytes(&self) -> [u8; OBJECT_ID_LEN] {
        self.0
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|byte| format!("{byte:02x}")).collect()
    }
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<ObjectId> for String {
    fn from(value: ObjectId) -> Self {
        value.to_hex()
    }
}

impl TryFrom<String> for ObjectId {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_str(&value)
    }
}

/// One value passed to a lookup call.
///
/// The variant observed at runtime drives classification: typed variants are
/// always treated as primary keys, `Text` may be a key or a slug.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    /// Missing value; always rejected before any query.
    Null,
    Text(String),
    ObjectId(ObjectId),
    Uuid(Uuid),
    Integer(i64),
}

impl Identifier {
    /// Returns the string payload when this identifier is string-like.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Null values and empty strings cannot be resolved.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(value) => value.is_empty(),
            _ => false,
        }
    }

    /// Canonical primary-key string used by the store.
    ///
    /// Returns `None` for `Null`.
    pub fn to_key_string(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Text(value) => Some(value.clone()),
            Self::ObjectId(value) => Some(value.to_hex()),
            Self::Uuid(value) => Some(value.hyphenated().to_string()),
            Self::Integer(value) => Some(value.to_string()),
        }
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Text(value) => f.write_str(value),
            Self::ObjectId(value) => write!(f, "{value}"),
            Self::Uuid(value) => write!(f, "{value}"),
            Self::Integer(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<ObjectId> for Identifier {
    fn from(value: ObjectId) -> Self {
        Self::ObjectId(value)
    }
}

impl From<Uuid> for Identifier {
    fn from(value: Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl From<i64> for Identifier {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl<T: Into<Identifier>> From<Option<T>> for Identifier {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
