//! Domain model for slug resolution.
//!
//! # Responsibility
//! - Define caller identifiers and stored document shapes.
//! - Keep model types storage-agnostic.
//!
//! # Invariants
//! - Every document is identified by its collection and canonical key string.
//! - Slug values are owned by documents; the model never generates them.

pub mod document;
pub mod identifier;
