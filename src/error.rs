//! Typed domain failures.
//!
//! Only two outcomes warrant a typed error: invalid field values caught
//! before any write, and duplicate unique fields on collaborator entities.
//! Lookup misses are `Option`/`bool` results, never errors — an unknown or
//! malformed id is indistinguishable from a valid-but-absent one.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A field value failed validation before reaching any store.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A unique field (project name, username, email) is already taken.
    #[error("conflict: {0}")]
    Conflict(String),
}
