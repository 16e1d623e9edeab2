//! Document store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Define the in-set query and key lookup seams consumed by the resolver.
//! - Persist collections, documents and their slug lists in SQLite.
//!
//! # Invariants
//! - Queries are always scoped to one collection.
//! - Result order is insertion order of documents (`rowid ASC`).
//! - Slug lists are stored and returned in caller-provided order.
//! - This layer never generates slugs and never enforces slug uniqueness.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::document::{Document, DocumentValidationError};
use crate::schema::{CollectionSchema, KeyType, KeyTypeDescriptor, SchemaError};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Name of the multi-valued slug field understood by the SQLite store.
pub const SLUGS_FIELD: &str = "_slugs";

const DOCUMENT_SELECT_SQL: &str = "SELECT d.id, d.body FROM documents d";

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence/query error for document stores.
#[derive(Debug)]
pub enum RepoError {
    Validation(DocumentValidationError),
    Schema(SchemaError),
    Db(DbError),
    CollectionNotFound(String),
    DocumentNotFound { collection: String, id: String },
    UnsupportedField(String),
    MissingRequiredTable(&'static str),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Schema(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::CollectionNotFound(name) => write!(f, "collection not found: {name}"),
            Self::DocumentNotFound { collection, id } => {
                write!(f, "document not found: {collection}/{id}")
            }
            Self::UnsupportedField(field) => write!(f, "field `{field}` cannot be queried"),
            Self::MissingRequiredTable(table) => write!(f, "required table missing: {table}"),
            Self::InvalidData(message) => write!(f, "invalid persisted document data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Schema(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DocumentValidationError> for RepoError {
    fn from(value: DocumentValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<SchemaError> for RepoError {
    fn from(value: SchemaError) -> Self {
        Self::Schema(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Executes "field intersects value set" queries against one collection.
pub trait QueryExecutor {
    /// Returns documents whose `field` shares at least one value with
    /// `values`, at most `limit` of them.
    fn execute_in_set(
        &self,
        field: &str,
        values: &[String],
        limit: usize,
    ) -> RepoResult<Vec<Document>>;
}

/// Default primary-key resolution for one collection.
pub trait KeyLookup {
    /// Returns documents whose primary key is in `keys`, at most `limit`.
    fn find_by_keys(&self, keys: &[String], limit: usize) -> RepoResult<Vec<Document>>;
}

impl<T: QueryExecutor + ?Sized> QueryExecutor for &T {
    fn execute_in_set(
        &self,
        field: &str,
        values: &[String],
        limit: usize,
    ) -> RepoResult<Vec<Document>> {
        (**self).execute_in_set(field, values, limit)
    }
}

impl<T: KeyLookup + ?Sized> KeyLookup for &T {
    fn find_by_keys(&self, keys: &[String], limit: usize) -> RepoResult<Vec<Document>> {
        (**self).find_by_keys(keys, limit)
    }
}

/// Registers a collection and its key type.
pub fn create_collection(conn: &Connection, name: &str, key_type: &KeyType) -> RepoResult<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(SchemaError::EmptyCollectionName.into());
    }

    conn.execute(
        "INSERT INTO collections (name, key_type) VALUES (?1, ?2);",
        params![name, key_type.as_tag()],
    )?;
    Ok(())
}

/// Loads the persisted schema for `name`.
///
/// Persisted schemas never carry a strategy override; callers attach one by
/// building their own `CollectionSchema`.
pub fn load_schema(conn: &Connection, name: &str) -> RepoResult<CollectionSchema> {
    let tag: Option<String> = conn
        .query_row(
            "SELECT key_type FROM collections WHERE name = ?1;",
            [name],
            |row| row.get(0),
        )
        .optional()?;

    let tag = tag.ok_or_else(|| RepoError::CollectionNotFound(name.to_string()))?;
    let kind = KeyType::parse_tag(&tag)?;
    Ok(CollectionSchema::new(name, KeyTypeDescriptor::new(kind))?)
}

/// SQLite-backed store scoped to one collection.
pub struct SqliteCollectionStore<'conn> {
    conn: &'conn mut Connection,
    schema: CollectionSchema,
}

impl<'conn> SqliteCollectionStore<'conn> {
    /// Binds a migrated connection to an existing collection.
    pub fn try_new(conn: &'conn mut Connection, collection: &str) -> RepoResult<Self> {
        ensure_store_connection_ready(conn)?;
        let schema = load_schema(conn, collection)?;
        Ok(Self { conn, schema })
    }

    pub fn schema(&self) -> &CollectionSchema {
        &self.schema
    }

    pub fn collection(&self) -> &str {
        self.schema.name()
    }

    /// Inserts one document together with its slug list.
    pub fn insert_document(&mut self, document: &Document) -> RepoResult<()> {
        document.validate()?;
        let collection = self.schema.name();
        if document.collection != collection {
            return Err(RepoError::InvalidData(format!(
                "document collection `{}` does not match store collection `{collection}`",
                document.collection
            )));
        }

        let body = serde_json::to_string(&document.body)
            .map_err(|err| RepoError::InvalidData(format!("unserializable body: {err}")))?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3);",
            params![collection, document.id, body],
        )?;
        write_slugs(&tx, collection, &document.id, &document.slugs)?;
        tx.commit()?;
        Ok(())
    }

    /// Replaces the whole slug list of one document atomically.
    pub fn set_slugs(&mut self, id: &str, slugs: &[String]) -> RepoResult<()> {
        if slugs.iter().any(|slug| slug.trim().is_empty()) {
            return Err(DocumentValidationError::BlankSlug.into());
        }

        let collection = self.schema.name();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let exists: Option<i64> = tx
            .query_row(
                "SELECT 1 FROM documents WHERE collection = ?1 AND id = ?2;",
                params![collection, id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(RepoError::DocumentNotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }

        tx.execute(
            "DELETE FROM document_slugs WHERE collection = ?1 AND document_id = ?2;",
            params![collection, id],
        )?;
        write_slugs(&tx, collection, id, slugs)?;
        tx.execute(
            "UPDATE documents
             SET updated_at = (strftime('%s', 'now') * 1000)
             WHERE collection = ?1 AND id = ?2;",
            params![collection, id],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Gets one document by primary key.
    pub fn get_document(&self, id: &str) -> RepoResult<Option<Document>> {
        let mut docs = self.find_by_keys(&[id.to_string()], 1)?;
        Ok(docs.pop())
    }

    fn query_documents(
        &self,
        predicate_sql: &str,
        values: &[String],
        limit: usize,
    ) -> RepoResult<Vec<Document>> {
        if values.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        // Values bind as a single JSON array; batch size is not bounded by
        // SQLite's host parameter limit.
        let values_json = serde_json::to_string(values)
            .map_err(|err| RepoError::InvalidData(format!("unserializable values: {err}")))?;
        let sql = format!(
            "{DOCUMENT_SELECT_SQL}
             WHERE d.collection = ?1
               AND {predicate_sql}
             ORDER BY d.rowid ASC
             LIMIT ?3"
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![
            self.collection(),
            values_json,
            i64::try_from(limit).unwrap_or(i64::MAX)
        ])?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next()? {
            let id: String = row.get(0)?;
            let body_text: String = row.get(1)?;
            let body: serde_json::Value = serde_json::from_str(&body_text).map_err(|err| {
                RepoError::InvalidData(format!("invalid body for `{id}` in documents.body: {err}"))
            })?;
            let slugs = load_slugs(&*self.conn, self.collection(), &id)?;
            documents.push(Document {
                collection: self.collection().to_string(),
                id,
                slugs,
                body,
            });
        }

        Ok(documents)
    }
}

impl QueryExecutor for SqliteCollectionStore<'_> {
    fn execute_in_set(
        &self,
        field: &str,
        values: &[String],
        limit: usize,
    ) -> RepoResult<Vec<Document>> {
        if field != SLUGS_FIELD {
            return Err(RepoError::UnsupportedField(field.to_string()));
        }

        let documents = self.query_documents(
            "EXISTS (
                SELECT 1
                FROM document_slugs s
                WHERE s.collection = d.collection
                  AND s.document_id = d.id
                  AND s.slug IN (SELECT value FROM json_each(?2))
             )",
            values,
            limit,
        )?;
        debug!(
            "event=query_in_set module=repo status=ok collection={} field={} values={} limit={} rows={}",
            self.collection(),
            field,
            values.len(),
            limit,
            documents.len()
        );
        Ok(documents)
    }
}

impl KeyLookup for SqliteCollectionStore<'_> {
    fn find_by_keys(&self, keys: &[String], limit: usize) -> RepoResult<Vec<Document>> {
        let documents = self
            .query_documents("d.id IN (SELECT value FROM json_each(?2))", keys, limit)?;
        debug!(
            "event=query_keys module=repo status=ok collection={} keys={} limit={} rows={}",
            self.collection(),
            keys.len(),
            limit,
            documents.len()
        );
        Ok(documents)
    }
}

fn write_slugs(conn: &Connection, collection: &str, id: &str, slugs: &[String]) -> RepoResult<()> {
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO document_slugs (collection, document_id, slug, position)
         VALUES (?1, ?2, ?3, ?4);",
    )?;
    for (position, slug) in slugs.iter().enumerate() {
        stmt.execute(params![
            collection,
            id,
            slug,
            i64::try_from(position).unwrap_or(i64::MAX)
        ])?;
    }
    Ok(())
}

fn load_slugs(conn: &Connection, collection: &str, id: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare_cached(
        "SELECT slug
         FROM document_slugs
         WHERE collection = ?1 AND document_id = ?2
         ORDER BY position ASC;",
    )?;
    let slugs = stmt
        .query_map(params![collection, id], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(slugs)
}

fn ensure_store_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(DbError::UninitializedConnection {
            expected_version,
            actual_version,
        }
        .into());
    }

    for table in ["collections", "documents", "document_slugs"] {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
