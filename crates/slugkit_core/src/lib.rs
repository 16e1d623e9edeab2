//! Slug-aware document lookup.
//! Resolves caller identifiers as primary keys or slugs through one call shape.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod schema;
pub mod service;
pub mod strategy;

pub use config::ResolverConfig;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::document::{Document, DocumentValidationError};
pub use model::identifier::{Identifier, IdentifierError, ObjectId};
pub use repo::document_repo::{
    create_collection, load_schema, KeyLookup, QueryExecutor, RepoError, RepoResult,
    SqliteCollectionStore, SLUGS_FIELD,
};
pub use schema::{CollectionSchema, KeyType, KeyTypeDescriptor, SchemaError};
pub use service::resolver::{Lookup, NotFound, Resolution, ResolveError, ResolveResult, Resolver};
pub use strategy::{SlugStrategy, StrategyCache, StrategyProvider, StrategyRegistry};

/// Minimal health-check API for embedders.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
