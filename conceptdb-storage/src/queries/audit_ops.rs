//! Audit log rows.

use rusqlite::{params, Connection};

use conceptdb_core::errors::ConceptDbResult;
use conceptdb_core::models::{AuditAction, AuditEntry};

use super::{corruption, parse_timestamp};
use crate::to_storage_err;

pub fn insert_entry(conn: &Connection, entry: &AuditEntry) -> ConceptDbResult<()> {
    conn.execute(
        "INSERT INTO audit_log (object_id, action, data, timestamp) VALUES (?1, ?2, ?3, ?4)",
        params![
            entry.object_id,
            entry.action.as_str(),
            serde_json::to_string(&entry.data)?,
            entry.timestamp.to_rfc3339(),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Entries for one object, oldest first.
pub fn entries_for(conn: &Connection, object_id: &str) -> ConceptDbResult<Vec<AuditEntry>> {
    let mut stmt = conn
        .prepare(
            "SELECT object_id, action, data, timestamp FROM audit_log
             WHERE object_id = ?1 ORDER BY id",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map([object_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut out = Vec::new();
    for row in rows {
        let (object_id, action, data, timestamp) =
            row.map_err(|e| to_storage_err(e.to_string()))?;
        let action = AuditAction::from_str_name(&action)
            .ok_or_else(|| corruption(format!("unknown audit action '{action}'")))?;
        out.push(AuditEntry {
            object_id,
            action,
            data: serde_json::from_str(&data)?,
            timestamp: parse_timestamp(&timestamp)?,
        });
    }
    Ok(out)
}
