//! Confidence values: last write wins.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use conceptdb_core::errors::ConceptDbResult;
use conceptdb_core::ReasonId;

use crate::to_storage_err;

pub fn get_confidence(conn: &Connection, id: &ReasonId) -> ConceptDbResult<Option<f64>> {
    conn.query_row(
        "SELECT confidence FROM confidence_values WHERE object_id = ?1",
        [id.to_string()],
        |row| row.get(0),
    )
    .optional()
    .map_err(|e| to_storage_err(e.to_string()))
}

pub fn set_confidence(conn: &Connection, id: &ReasonId, confidence: f64) -> ConceptDbResult<()> {
    conn.execute(
        "INSERT INTO confidence_values (object_id, confidence, updated_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(object_id) DO UPDATE SET
            confidence = excluded.confidence,
            updated_at = excluded.updated_at",
        params![id.to_string(), confidence, Utc::now().to_rfc3339()],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Write every value in one transaction.
pub fn set_many(conn: &Connection, values: &[(ReasonId, f64)]) -> ConceptDbResult<usize> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_storage_err(e.to_string()))?;
    for (id, confidence) in values {
        set_confidence(&tx, id, *confidence)?;
    }
    tx.commit().map_err(|e| to_storage_err(e.to_string()))?;
    Ok(values.len())
}

pub fn count_confidences(conn: &Connection) -> ConceptDbResult<usize> {
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM confidence_values", [], |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(n as usize)
}
