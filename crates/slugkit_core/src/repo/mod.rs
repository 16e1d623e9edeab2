//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the query seams the resolver depends on.
//! - Isolate SQLite details from resolution logic.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`CollectionNotFound`,
//!   `UnsupportedField`) in addition to DB transport errors.

pub mod document_repo;
