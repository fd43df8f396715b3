//! # conceptdb-storage
//!
//! SQLite persistence for ConceptDB. Implements `IReasonStorage`,
//! `IConfidenceStorage`, `IEntityStorage` and `IAuditLog` from
//! `conceptdb-core` behind a single write connection.

pub mod engine;
pub mod migrations;
pub mod pool;
pub mod queries;

pub use engine::StorageEngine;

/// Helper to convert a string message into a ConceptDbError::Storage.
pub fn to_storage_err(msg: String) -> conceptdb_core::ConceptDbError {
    conceptdb_core::ConceptDbError::Storage(conceptdb_core::errors::StorageError::SqliteError {
        message: msg,
    })
}
