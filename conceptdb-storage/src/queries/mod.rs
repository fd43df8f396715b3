pub mod audit_ops;
pub mod confidence_ops;
pub mod entity_ops;
pub mod reason_ops;

use chrono::{DateTime, Utc};

use conceptdb_core::errors::{ConceptDbError, ConceptDbResult, StorageError};

pub(crate) fn parse_timestamp(text: &str) -> ConceptDbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| corruption(format!("bad timestamp '{text}': {e}")))
}

pub(crate) fn corruption(details: String) -> ConceptDbError {
    ConceptDbError::Storage(StorageError::CorruptionDetected { details })
}
