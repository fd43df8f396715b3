//! v002: confidence_values, one row per scored id.

use rusqlite::Connection;

use conceptdb_core::errors::ConceptDbResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> ConceptDbResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS confidence_values (
            object_id   TEXT PRIMARY KEY,
            confidence  REAL NOT NULL,
            updated_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_confidence_value ON confidence_values(confidence);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
