//! Migration runner: version tracking, forward-only, one transaction per
//! migration.

mod v001_reason_tables;
mod v002_confidence_tables;
mod v003_entity_tables;
mod v004_audit_tables;

use rusqlite::Connection;
use tracing::{debug, info, warn};

use conceptdb_core::errors::{ConceptDbError, ConceptDbResult, StorageError};

use crate::to_storage_err;

pub const LATEST_VERSION: u32 = 4;

type MigrationFn = fn(&Connection) -> ConceptDbResult<()>;

const MIGRATIONS: [(u32, &str, MigrationFn); 4] = [
    (1, "reason_tables", v001_reason_tables::migrate),
    (2, "confidence_tables", v002_confidence_tables::migrate),
    (3, "entity_tables", v003_entity_tables::migrate),
    (4, "audit_tables", v004_audit_tables::migrate),
];

/// Current schema version, 0 for a fresh database.
pub fn current_version(conn: &Connection) -> ConceptDbResult<u32> {
    let exists: bool = conn
        .prepare("SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version'")
        .and_then(|mut stmt| stmt.exists([]))
        .map_err(|e| to_storage_err(e.to_string()))?;

    if !exists {
        return Ok(0);
    }

    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .map_err(|e| to_storage_err(e.to_string()))
}

/// Apply every pending migration. Returns how many ran.
pub fn run_migrations(conn: &Connection) -> ConceptDbResult<u32> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    let current = current_version(conn)?;
    if current >= LATEST_VERSION {
        debug!("database schema is up to date (v{current})");
        return Ok(0);
    }
    info!("running migrations: v{current} -> v{LATEST_VERSION}");

    let mut applied = 0;
    for &(version, name, migrate_fn) in &MIGRATIONS {
        if version <= current {
            continue;
        }
        debug!("applying migration v{version:03}: {name}");

        conn.execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| to_storage_err(format!("begin transaction for v{version:03}: {e}")))?;

        let result = migrate_fn(conn).and_then(|()| {
            conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])
                .map_err(|e| to_storage_err(format!("record version v{version:03}: {e}")))?;
            Ok(())
        });

        match result {
            Ok(()) => {
                conn.execute_batch("COMMIT")
                    .map_err(|e| to_storage_err(format!("commit v{version:03}: {e}")))?;
                info!("applied migration v{version:03}: {name}");
                applied += 1;
            }
            Err(e) => {
                warn!("migration v{version:03} failed: {e}, rolling back");
                let _ = conn.execute_batch("ROLLBACK");
                return Err(ConceptDbError::Storage(StorageError::MigrationFailed {
                    version,
                    reason: e.to_string(),
                }));
            }
        }
    }
    Ok(applied)
}
