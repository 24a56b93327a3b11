//! Storage error types for kindred-storage.
//!
//! [`StorageError`] covers all anticipated failure modes in the persistence
//! layer: statement resolution, save failures, integrity violations, cursor
//! misuse, and the underlying SQLite errors.

use thiserror::Error;

use crate::statement::CrudOperation;

/// Errors produced by storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The underlying SQLite call failed.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A schema migration failed while opening the database.
    #[error("migration error: {0}")]
    Migration(String),

    /// No statement is resolvable for the requested operation. Raised
    /// lazily, at the first invocation of that operation.
    #[error("no {operation} statement defined for entity kind '{entity}'")]
    StatementNotDefined {
        entity: &'static str,
        operation: CrudOperation,
    },

    /// An insert failed; carries a human-readable rendering of the entity.
    #[error("unable to save entity: {entity}")]
    UnableToSave {
        entity: String,
        #[source]
        source: Box<StorageError>,
    },

    /// A delete or update was attempted on an entity the store has never
    /// assigned an identifier to.
    #[error("no identifier found on entity: {entity}")]
    MissingIdentifier { entity: String },

    /// The row cursor was read while not positioned on a row.
    #[error("row cursor is not positioned on a row")]
    CursorNotPositioned,
}
