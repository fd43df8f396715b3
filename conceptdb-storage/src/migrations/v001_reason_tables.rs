//! v001: reasons, unique on (target, factor_key).

use rusqlite::Connection;

use conceptdb_core::errors::ConceptDbResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> ConceptDbResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS reasons (
            id          TEXT PRIMARY KEY,
            target      TEXT NOT NULL,
            factor_key  TEXT NOT NULL,
            factors     TEXT NOT NULL DEFAULT '[]',
            vote        REAL NOT NULL,
            weight      REAL NOT NULL,
            polarity    TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_reasons_key ON reasons(target, factor_key);
        CREATE INDEX IF NOT EXISTS idx_reasons_weight ON reasons(weight);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
