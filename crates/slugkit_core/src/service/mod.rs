//! Core use-case services.
//!
//! # Responsibility
//! - Classify lookup batches and resolve them through repository seams.
//! - Keep resolution logic independent of any concrete store.

pub mod classifier;
pub mod resolver;
