//! Reason upsert and lookups.

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::instrument;

use conceptdb_core::errors::ConceptDbResult;
use conceptdb_core::{Polarity, ReasonId, ReasonRecord};

use super::{corruption, parse_timestamp};
use crate::to_storage_err;

const COLUMNS: &str = "id, target, factors, vote, weight, polarity, created_at, updated_at";

/// A row as stored, before parsing.
struct RawReason {
    id: String,
    target: String,
    factors: String,
    vote: f64,
    weight: f64,
    polarity: String,
    created_at: String,
    updated_at: String,
}

impl RawReason {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            target: row.get(1)?,
            factors: row.get(2)?,
            vote: row.get(3)?,
            weight: row.get(4)?,
            polarity: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }

    fn into_record(self) -> ConceptDbResult<ReasonRecord> {
        let factors: Vec<ReasonId> = serde_json::from_str(&self.factors)
            .map_err(|e| corruption(format!("reason {}: bad factor list: {e}", self.id)))?;
        let polarity = Polarity::from_str_name(&self.polarity).ok_or_else(|| {
            corruption(format!("reason {}: unknown polarity '{}'", self.id, self.polarity))
        })?;
        Ok(ReasonRecord {
            target: ReasonId::parse(&self.target),
            factors,
            vote: self.vote,
            weight: self.weight,
            polarity,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
            id: self.id,
        })
    }
}

/// Insert the record for `(target, factor set)` or update its vote, weight
/// and factor order in place. One statement, so concurrent writers cannot
/// create duplicates. Returns the stored record and whether it was new.
#[instrument(skip_all, fields(id = %target, vote = vote, weight = weight))]
pub fn upsert_reason(
    conn: &Connection,
    target: &ReasonId,
    factors: &[ReasonId],
    vote: f64,
    weight: f64,
) -> ConceptDbResult<(ReasonRecord, bool)> {
    let fresh = ReasonRecord::new(target.clone(), factors.to_vec(), vote, weight);
    let factors_json = serde_json::to_string(&fresh.factors)?;
    let now = fresh.created_at.to_rfc3339();

    let raw = conn
        .query_row(
            &format!(
                "INSERT INTO reasons
                    (id, target, factor_key, factors, vote, weight, polarity, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
                 ON CONFLICT(target, factor_key) DO UPDATE SET
                    factors = excluded.factors,
                    vote = excluded.vote,
                    weight = excluded.weight,
                    polarity = excluded.polarity,
                    updated_at = excluded.updated_at
                 RETURNING {COLUMNS}"
            ),
            params![
                fresh.id,
                target.to_string(),
                fresh.key(),
                factors_json,
                vote,
                weight,
                fresh.polarity.as_str(),
                now,
            ],
            RawReason::from_row,
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    let created = raw.created_at == now;
    Ok((raw.into_record()?, created))
}

pub fn get_reason(conn: &Connection, id: &str) -> ConceptDbResult<Option<ReasonRecord>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM reasons WHERE id = ?1"),
        [id],
        RawReason::from_row,
    )
    .optional()
    .map_err(|e| to_storage_err(e.to_string()))?
    .map(RawReason::into_record)
    .transpose()
}

pub fn reasons_by_target(conn: &Connection, target: &ReasonId) -> ConceptDbResult<Vec<ReasonRecord>> {
    query_records(
        conn,
        &format!("SELECT {COLUMNS} FROM reasons WHERE target = ?1 ORDER BY factor_key"),
        &target.to_string(),
    )
}

pub fn reasons_by_factor(conn: &Connection, factor: &ReasonId) -> ConceptDbResult<Vec<ReasonRecord>> {
    query_records(
        conn,
        &format!(
            "SELECT {COLUMNS} FROM reasons
             WHERE EXISTS (SELECT 1 FROM json_each(reasons.factors) WHERE json_each.value = ?1)
             ORDER BY target, factor_key"
        ),
        &factor.to_string(),
    )
}

pub fn all_reasons(conn: &Connection) -> ConceptDbResult<Vec<ReasonRecord>> {
    let mut stmt = conn
        .prepare(&format!("SELECT {COLUMNS} FROM reasons ORDER BY target, factor_key"))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map([], RawReason::from_row)
        .map_err(|e| to_storage_err(e.to_string()))?;
    collect(rows)
}

pub fn count_reasons(conn: &Connection) -> ConceptDbResult<usize> {
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM reasons", [], |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(n as usize)
}

fn query_records(conn: &Connection, sql: &str, key: &str) -> ConceptDbResult<Vec<ReasonRecord>> {
    let mut stmt = conn.prepare(sql).map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map([key], RawReason::from_row)
        .map_err(|e| to_storage_err(e.to_string()))?;
    collect(rows)
}

fn collect(
    rows: impl Iterator<Item = rusqlite::Result<RawReason>>,
) -> ConceptDbResult<Vec<ReasonRecord>> {
    let mut out = Vec::new();
    for row in rows {
        let raw = row.map_err(|e| to_storage_err(e.to_string()))?;
        out.push(raw.into_record()?);
    }
    Ok(out)
}
