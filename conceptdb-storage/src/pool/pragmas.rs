//! PRAGMA configuration applied to the SQLite connection.

use rusqlite::Connection;

use conceptdb_core::config::StorageConfig;
use conceptdb_core::errors::ConceptDbResult;

use crate::to_storage_err;

/// Journal, cache and timeout settings for a file-backed connection.
pub fn apply_pragmas(conn: &Connection, config: &StorageConfig) -> ConceptDbResult<()> {
    let journal = if config.wal_mode { "WAL" } else { "DELETE" };
    conn.execute_batch(&format!(
        "
        PRAGMA journal_mode = {journal};
        PRAGMA synchronous = NORMAL;
        PRAGMA cache_size = {cache};
        PRAGMA busy_timeout = {timeout};
        PRAGMA foreign_keys = ON;
        ",
        cache = config.cache_size,
        timeout = config.busy_timeout_ms,
    ))
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// In-memory databases have no journal to configure.
pub fn apply_memory_pragmas(conn: &Connection) -> ConceptDbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Verify that WAL mode is active on a connection.
pub fn verify_wal_mode(conn: &Connection) -> ConceptDbResult<bool> {
    let mode: String = conn
        .pragma_query_value(None, "journal_mode", |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(mode.eq_ignore_ascii_case("wal"))
}
