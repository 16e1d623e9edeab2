//! Slug-aware document resolver.
//!
//! # Responsibility
//! - Accept primary keys or slugs through one `find` call shape.
//! - Pick the key or slug path per batch, run it, and validate completeness.
//! - Shape results by call shape: one identifier in, one document out.
//!
//! # Invariants
//! - Blank identifiers are rejected before any query is issued.
//! - Returned documents are deduplicated by primary key, first occurrence wins,
//!   in the order the executor produced them.
//! - `missing` keeps input order and unmatched duplicates.
//! - Store errors pass through unchanged; nothing is retried here.

use crate::config::ResolverConfig;
use crate::model::document::Document;
use crate::model::identifier::{Identifier, ObjectId};
use crate::repo::document_repo::{KeyLookup, QueryExecutor, RepoError};
use crate::schema::{CollectionSchema, KeyType};
use crate::service::classifier::looks_like_slugs;
use crate::strategy::{StrategyCache, StrategyProvider, StrategyRegistry};
use log::{debug, info};
use serde::Serialize;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ResolveResult<T> = Result<T, ResolveError>;

/// Structured payload for the application's not-found channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotFound {
    pub collection: String,
    /// Every requested value, duplicates included.
    pub requested: Vec<String>,
    /// Requested values with no matching document.
    pub missing: Vec<String>,
}

impl NotFound {
    /// True when nothing requested matched.
    pub fn is_total(&self) -> bool {
        self.missing.len() == self.requested.len()
    }
}

impl Display for NotFound {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "document not found in `{}` for {:?}; missing {:?}",
            self.collection, self.requested, self.missing
        )
    }
}

/// Resolver failure.
#[derive(Debug)]
pub enum ResolveError {
    /// A requested identifier was null or empty.
    InvalidArgument(String),
    /// At least one requested value matched nothing.
    DocumentNotFound(NotFound),
    /// Executor failure, passed through unchanged.
    Store(RepoError),
}

impl Display for ResolveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::DocumentNotFound(payload) => write!(f, "{payload}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ResolveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ResolveError {
    fn from(value: RepoError) -> Self {
        Self::Store(value)
    }
}

/// Call shape of a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// One bare identifier; resolves to at most one document.
    One(Identifier),
    /// A collection of identifiers; always resolves to a sequence.
    Many(Vec<Identifier>),
}

impl Lookup {
    pub fn is_multi(&self) -> bool {
        matches!(self, Self::Many(_))
    }

    pub fn identifiers(&self) -> &[Identifier] {
        match self {
            Self::One(identifier) => std::slice::from_ref(identifier),
            Self::Many(identifiers) => identifiers,
        }
    }
}

impl<T: Into<Identifier>> From<Vec<T>> for Lookup {
    fn from(value: Vec<T>) -> Self {
        Self::Many(value.into_iter().map(Into::into).collect())
    }
}

/// Result of a successful lookup, shaped like the call.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// `None` only when nothing matched and the not-found policy is off.
    One(Option<Document>),
    Many(Vec<Document>),
}

impl Resolution {
    pub fn into_vec(self) -> Vec<Document> {
        match self {
            Self::One(document) => document.into_iter().collect(),
            Self::Many(documents) => documents,
        }
    }

    /// First resolved document, regardless of shape.
    pub fn into_first(self) -> Option<Document> {
        self.into_vec().into_iter().next()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LookupPath {
    Key,
    Slug,
}

impl LookupPath {
    fn as_str(self) -> &'static str {
        match self {
            Self::Key => "key",
            Self::Slug => "slug",
        }
    }
}

/// Resolves identifiers against one collection.
pub struct Resolver<E, P = StrategyRegistry> {
    schema: CollectionSchema,
    executor: E,
    provider: P,
    strategy: StrategyCache,
    config: ResolverConfig,
}

impl<E> Resolver<E, StrategyRegistry> {
    /// Creates a resolver using the built-in strategy registry.
    pub fn new(schema: CollectionSchema, executor: E, config: ResolverConfig) -> Self {
        Self::with_provider(schema, executor, StrategyRegistry::with_builtins(), config)
    }
}

impl<E, P: StrategyProvider> Resolver<E, P> {
    pub fn with_provider(
        schema: CollectionSchema,
        executor: E,
        provider: P,
        config: ResolverConfig,
    ) -> Self {
        Self {
            schema,
            executor,
            provider,
            strategy: StrategyCache::new(),
            config,
        }
    }

    pub fn schema(&self) -> &CollectionSchema {
        &self.schema
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Returns whether the whole batch would be resolved through slugs.
    pub fn looks_like_slugs(&self, identifiers: &[Identifier]) -> bool {
        looks_like_slugs(
            identifiers,
            self.schema.key(),
            &self.strategy,
            &self.provider,
        )
    }
}

impl<E, P> Resolver<E, P>
where
    E: QueryExecutor + KeyLookup,
    P: StrategyProvider,
{
    /// Resolves `lookup` by primary key or slug.
    ///
    /// # Errors
    /// - `InvalidArgument` when any identifier is null or empty.
    /// - `DocumentNotFound` when a value matched nothing and
    ///   `raise_not_found` is enabled.
    /// - `Store` for executor failures.
    pub fn find(&self, lookup: Lookup) -> ResolveResult<Resolution> {
        let identifiers = lookup.identifiers();
        ensure_identifiers_present(identifiers)?;

        if identifiers.is_empty() {
            return Ok(Resolution::Many(Vec::new()));
        }

        let path = if self.looks_like_slugs(identifiers) {
            LookupPath::Slug
        } else {
            LookupPath::Key
        };
        let documents = self.run(path, identifiers)?;
        Ok(shape(documents, lookup.is_multi()))
    }

    /// Resolves one identifier to at most one document.
    pub fn find_one(&self, identifier: impl Into<Identifier>) -> ResolveResult<Option<Document>> {
        Ok(self.find(Lookup::One(identifier.into()))?.into_first())
    }

    /// Resolves a collection of identifiers to a sequence.
    pub fn find_many<I, T>(&self, identifiers: I) -> ResolveResult<Vec<Document>>
    where
        I: IntoIterator<Item = T>,
        T: Into<Identifier>,
    {
        let identifiers = identifiers.into_iter().map(Into::into).collect();
        Ok(self.find(Lookup::Many(identifiers))?.into_vec())
    }

    /// Resolves one slug, skipping key classification.
    pub fn find_by_slug(&self, slug: &str) -> ResolveResult<Option<Document>> {
        let identifier = Identifier::from(slug);
        ensure_identifiers_present(std::slice::from_ref(&identifier))?;
        let documents = self.run(LookupPath::Slug, std::slice::from_ref(&identifier))?;
        Ok(shape(documents, false).into_first())
    }

    fn run(&self, path: LookupPath, identifiers: &[Identifier]) -> ResolveResult<Vec<Document>> {
        let requested: Vec<String> = identifiers
            .iter()
            .filter_map(|identifier| match path {
                LookupPath::Slug => identifier.as_text().map(str::to_string),
                LookupPath::Key => canonical_key(identifier, &self.schema.key().kind),
            })
            .collect();

        let limit = requested.len();
        let fetched = match path {
            LookupPath::Slug => {
                self.executor
                    .execute_in_set(&self.config.slug_field, &requested, limit)?
            }
            LookupPath::Key => self.executor.find_by_keys(&requested, limit)?,
        };
        let documents = dedupe_by_id(fetched);

        let missing = match path {
            LookupPath::Slug => missing_values(
                &requested,
                documents.iter().flat_map(|doc| doc.slugs.iter().map(String::as_str)),
            ),
            LookupPath::Key => {
                missing_values(&requested, documents.iter().map(|doc| doc.id.as_str()))
            }
        };

        if missing.is_empty() {
            debug!(
                "event=resolve module=resolver status=ok collection={} path={} requested={} found={}",
                self.schema.name(),
                path.as_str(),
                requested.len(),
                documents.len()
            );
            return Ok(documents);
        }

        if self.config.raise_not_found {
            info!(
                "event=resolve module=resolver status=not_found collection={} path={} requested={} missing={}",
                self.schema.name(),
                path.as_str(),
                requested.len(),
                missing.len()
            );
            return Err(ResolveError::DocumentNotFound(NotFound {
                collection: self.schema.name().to_string(),
                requested,
                missing,
            }));
        }

        debug!(
            "event=resolve module=resolver status=partial collection={} path={} requested={} missing={} found={}",
            self.schema.name(),
            path.as_str(),
            requested.len(),
            missing.len(),
            documents.len()
        );
        Ok(documents)
    }
}

fn shape(documents: Vec<Document>, multi: bool) -> Resolution {
    if multi {
        return Resolution::Many(documents);
    }
    Resolution::One(documents.into_iter().next())
}

/// Key string as stored; legal ObjectId text is compared as lowercase hex.
fn canonical_key(identifier: &Identifier, key_type: &KeyType) -> Option<String> {
    match (identifier, key_type) {
        (Identifier::Text(text), KeyType::ObjectId) if ObjectId::is_legal(text) => {
            Some(text.to_ascii_lowercase())
        }
        _ => identifier.to_key_string(),
    }
}

fn ensure_identifiers_present(identifiers: &[Identifier]) -> ResolveResult<()> {
    match identifiers.iter().position(Identifier::is_blank) {
        Some(index) => Err(ResolveError::InvalidArgument(format!(
            "identifier at position {index} is null or empty"
        ))),
        None => Ok(()),
    }
}

fn dedupe_by_id(documents: Vec<Document>) -> Vec<Document> {
    let mut seen = HashSet::with_capacity(documents.len());
    documents
        .into_iter()
        .filter(|doc| seen.insert(doc.id.clone()))
        .collect()
}

/// List difference: every occurrence of a matched value is removed, and
/// unmatched values keep their order and multiplicity.
fn missing_values<'a>(
    requested: &[String],
    matched: impl Iterator<Item = &'a str>,
) -> Vec<String> {
    let matched: HashSet<&str> = matched.collect();
    requested
        .iter()
        .filter(|value| !matched.contains(value.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{canonical_key, dedupe_by_id, missing_values, Lookup, Resolution};
    use crate::model::document::Document;
    use crate::model::identifier::Identifier;
    use crate::schema::KeyType;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn missing_values_keeps_unmatched_duplicates_in_input_order() {
        let requested = strings(&["b", "a", "c", "b", "a"]);
        let missing = missing_values(&requested, ["a"].into_iter());
        assert_eq!(missing, strings(&["b", "c", "b"]));
    }

    #[test]
    fn canonical_key_lowercases_object_id_text_only() {
        let upper = Identifier::from("4E9B8E4F5B4F1A0001000001");
        assert_eq!(
            canonical_key(&upper, &KeyType::ObjectId).as_deref(),
            Some("4e9b8e4f5b4f1a0001000001")
        );
        assert_eq!(
            canonical_key(&upper, &KeyType::String).as_deref(),
            Some("4E9B8E4F5B4F1A0001000001")
        );
        assert_eq!(
            canonical_key(&Identifier::from("Not-Hex"), &KeyType::ObjectId).as_deref(),
            Some("Not-Hex")
        );
    }

    #[test]
    fn dedupe_keeps_first_occurrence() {
        let docs = vec![
            Document::new("posts", "1").with_slugs(["a"]),
            Document::new("posts", "2").with_slugs(["b"]),
            Document::new("posts", "1").with_slugs(["a-old"]),
        ];
        let deduped = dedupe_by_id(docs);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].slugs, vec!["a".to_string()]);
        assert_eq!(deduped[1].id, "2");
    }

    #[test]
    fn lookup_exposes_identifiers_for_both_shapes() {
        let one = Lookup::One(Identifier::from("a"));
        assert!(!one.is_multi());
        assert_eq!(one.identifiers().len(), 1);

        let many = Lookup::from(vec!["a", "b"]);
        assert!(many.is_multi());
        assert_eq!(many.identifiers()[1], Identifier::from("b"));
    }

    #[test]
    fn resolution_into_vec_flattens_single_shape() {
        assert!(Resolution::One(None).into_vec().is_empty());
        let doc = Document::new("posts", "1");
        assert_eq!(Resolution::One(Some(doc.clone())).into_first(), Some(doc));
    }
}
