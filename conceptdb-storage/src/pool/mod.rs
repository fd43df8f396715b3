//! The single write connection every operation goes through.

pub mod pragmas;

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

use conceptdb_core::config::StorageConfig;
use conceptdb_core::errors::{ConceptDbError, ConceptDbResult};

use crate::to_storage_err;

/// A SQLite connection behind a mutex. Serialises all access, which is what
/// makes multi-statement operations atomic with respect to each other.
pub struct WriteConnection {
    conn: Mutex<Connection>,
}

impl WriteConnection {
    pub fn open(path: &Path, config: &StorageConfig) -> ConceptDbResult<Self> {
        let conn = Connection::open(path).map_err(|e| to_storage_err(e.to_string()))?;
        pragmas::apply_pragmas(&conn, config)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> ConceptDbResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| to_storage_err(e.to_string()))?;
        pragmas::apply_memory_pragmas(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run `f` with exclusive access to the connection.
    pub fn with_conn_sync<F, T>(&self, f: F) -> ConceptDbResult<T>
    where
        F: FnOnce(&Connection) -> ConceptDbResult<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|_| ConceptDbError::Concurrency("write connection lock poisoned".to_string()))?;
        f(&conn)
    }
}
