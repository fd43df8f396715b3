use crate::errors::ConceptDbResult;
use crate::models::AuditEntry;

/// Append-only change log.
pub trait IAuditLog: Send + Sync {
    fn append(&self, entry: &AuditEntry) -> ConceptDbResult<()>;
    fn for_object(&self, object_id: &str) -> ConceptDbResult<Vec<AuditEntry>>;
}
