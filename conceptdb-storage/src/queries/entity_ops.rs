//! Entity bodies.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use conceptdb_core::errors::ConceptDbResult;
use conceptdb_core::{EntityKind, ReasonId};

use crate::to_storage_err;

/// Insert or replace an entity body. Returns true when the entity is new.
pub fn upsert_entity(
    conn: &Connection,
    id: &ReasonId,
    kind: EntityKind,
    body: &str,
) -> ConceptDbResult<bool> {
    let key = id.to_string();
    let existed = conn
        .prepare("SELECT 1 FROM entities WHERE id = ?1")
        .and_then(|mut stmt| stmt.exists([&key]))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO entities (id, kind, body, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)
         ON CONFLICT(id) DO UPDATE SET
            body = excluded.body,
            updated_at = excluded.updated_at",
        params![key, kind.as_str(), body, now],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(!existed)
}

pub fn get_entity(conn: &Connection, id: &ReasonId) -> ConceptDbResult<Option<String>> {
    conn.query_row(
        "SELECT body FROM entities WHERE id = ?1",
        [id.to_string()],
        |row| row.get(0),
    )
    .optional()
    .map_err(|e| to_storage_err(e.to_string()))
}

pub fn entity_ids(conn: &Connection, kind: EntityKind) -> ConceptDbResult<Vec<ReasonId>> {
    let mut stmt = conn
        .prepare("SELECT id FROM entities WHERE kind = ?1 ORDER BY id")
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map([kind.as_str()], |row| row.get::<_, String>(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(ReasonId::parse(&row.map_err(|e| to_storage_err(e.to_string()))?));
    }
    Ok(out)
}
