//! v004: audit_log.

use rusqlite::Connection;

use conceptdb_core::errors::ConceptDbResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> ConceptDbResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS audit_log (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            object_id   TEXT NOT NULL,
            action      TEXT NOT NULL,
            data        TEXT NOT NULL DEFAULT '{}',
            timestamp   TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_audit_object ON audit_log(object_id, timestamp);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
