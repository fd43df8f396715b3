//! StorageEngine: owns the write connection, runs migrations, implements the
//! ConceptDB storage traits and records every create and update in the audit
//! log.

use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::Connection;
use tracing::{debug, warn};

use conceptdb_core::config::StorageConfig;
use conceptdb_core::errors::{ConceptDbError, ConceptDbResult, StorageError};
use conceptdb_core::models::{AuditAction, AuditEntry};
use conceptdb_core::traits::{IAuditLog, IConfidenceStorage, IEntityStorage, IReasonStorage};
use conceptdb_core::{Confidence, EntityKind, ReasonId, ReasonRecord};

use crate::migrations;
use crate::pool::WriteConnection;
use crate::queries::{audit_ops, confidence_ops, entity_ops, reason_ops};
use crate::to_storage_err;

/// SQLite-backed store for reasons, confidences, entities and the audit log.
pub struct StorageEngine {
    writer: WriteConnection,
    db_path: Option<PathBuf>,
}

impl StorageEngine {
    /// Open a storage engine backed by a file on disk, with default settings.
    pub fn open(path: &Path) -> ConceptDbResult<Self> {
        let config = StorageConfig {
            db_path: path.display().to_string(),
            ..StorageConfig::default()
        };
        Self::open_with_config(&config)
    }

    pub fn open_with_config(config: &StorageConfig) -> ConceptDbResult<Self> {
        let path = PathBuf::from(&config.db_path);
        let engine = Self {
            writer: WriteConnection::open(&path, config)?,
            db_path: Some(path),
        };
        engine.initialize()?;
        Ok(engine)
    }

    /// Open an in-memory storage engine (for testing).
    pub fn open_in_memory() -> ConceptDbResult<Self> {
        let engine = Self {
            writer: WriteConnection::open_in_memory()?,
            db_path: None,
        };
        engine.initialize()?;
        Ok(engine)
    }

    fn initialize(&self) -> ConceptDbResult<()> {
        self.writer.with_conn_sync(|conn| {
            migrations::run_migrations(conn)?;
            Ok(())
        })
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    pub fn schema_version(&self) -> ConceptDbResult<u32> {
        self.writer.with_conn_sync(migrations::current_version)
    }

    /// Run SQLite's integrity check.
    pub fn integrity_check(&self) -> ConceptDbResult<()> {
        self.writer.with_conn_sync(|conn| {
            let result: String = conn
                .query_row("PRAGMA integrity_check", [], |row| row.get(0))
                .map_err(|e| to_storage_err(e.to_string()))?;
            if result != "ok" {
                return Err(ConceptDbError::Storage(StorageError::CorruptionDetected {
                    details: result,
                }));
            }
            Ok(())
        })
    }

    /// Get one reason by record id.
    pub fn get_reason(&self, id: &str) -> ConceptDbResult<Option<ReasonRecord>> {
        self.writer
            .with_conn_sync(|conn| reason_ops::get_reason(conn, id))
    }

    /// Number of stored confidence values.
    pub fn confidence_count(&self) -> ConceptDbResult<usize> {
        self.writer.with_conn_sync(confidence_ops::count_confidences)
    }
}

fn audit(conn: &Connection, object_id: &str, action: AuditAction, data: serde_json::Value) -> ConceptDbResult<()> {
    audit_ops::insert_entry(
        conn,
        &AuditEntry {
            object_id: object_id.to_string(),
            action,
            data,
            timestamp: Utc::now(),
        },
    )
}

impl IReasonStorage for StorageEngine {
    fn make(
        &self,
        target: &ReasonId,
        factors: &[ReasonId],
        vote: f64,
        weight: f64,
    ) -> ConceptDbResult<ReasonRecord> {
        if factors.is_empty() {
            return Err(ConceptDbError::InvalidArgument(format!(
                "reason for {target} has no factors"
            )));
        }
        if !(0.0..=1.0).contains(&vote) {
            return Err(ConceptDbError::InvalidArgument(format!(
                "vote {vote} is outside [0, 1]"
            )));
        }
        if !weight.is_finite() {
            return Err(ConceptDbError::InvalidArgument(format!(
                "weight {weight} is not finite"
            )));
        }
        self.writer.with_conn_sync(|conn| {
            let (record, created) = reason_ops::upsert_reason(conn, target, factors, vote, weight)?;
            let action = if created {
                AuditAction::Create
            } else {
                AuditAction::Update
            };
            audit(
                conn,
                &record.node_id().to_string(),
                action,
                serde_json::json!({"vote": vote, "weight": weight}),
            )?;
            debug!(id = %record.id, created, "reason stored");
            Ok(record)
        })
    }

    fn by_target(&self, target: &ReasonId) -> ConceptDbResult<Vec<ReasonRecord>> {
        self.writer
            .with_conn_sync(|conn| reason_ops::reasons_by_target(conn, target))
    }

    fn by_factor(&self, factor: &ReasonId) -> ConceptDbResult<Vec<ReasonRecord>> {
        self.writer
            .with_conn_sync(|conn| reason_ops::reasons_by_factor(conn, factor))
    }

    fn all(&self) -> ConceptDbResult<Vec<ReasonRecord>> {
        self.writer.with_conn_sync(reason_ops::all_reasons)
    }

    fn count(&self) -> ConceptDbResult<usize> {
        self.writer.with_conn_sync(reason_ops::count_reasons)
    }
}

impl IConfidenceStorage for StorageEngine {
    fn get_stored(&self, id: &ReasonId) -> ConceptDbResult<Option<Confidence>> {
        Ok(self
            .writer
            .with_conn_sync(|conn| confidence_ops::get_confidence(conn, id))?
            .map(Confidence::new))
    }

    fn set(&self, id: &ReasonId, confidence: Confidence) -> ConceptDbResult<()> {
        self.writer
            .with_conn_sync(|conn| confidence_ops::set_confidence(conn, id, confidence.value()))
    }

    fn set_many(&self, values: &[(ReasonId, Confidence)]) -> ConceptDbResult<usize> {
        let raw: Vec<(ReasonId, f64)> = values
            .iter()
            .map(|(id, c)| (id.clone(), c.value()))
            .collect();
        self.writer
            .with_conn_sync(|conn| confidence_ops::set_many(conn, &raw))
    }
}

impl IEntityStorage for StorageEngine {
    fn save_entity(&self, id: &ReasonId, body: &serde_json::Value) -> ConceptDbResult<()> {
        let text = serde_json::to_string(body)?;
        self.writer.with_conn_sync(|conn| {
            let created = entity_ops::upsert_entity(conn, id, id.kind(), &text)?;
            let action = if created {
                AuditAction::Create
            } else {
                AuditAction::Update
            };
            audit(conn, &id.to_string(), action, serde_json::json!({}))
        })
    }

    /// A body that no longer parses is logged as an error and reported as
    /// corruption.
    fn load_entity(&self, id: &ReasonId) -> ConceptDbResult<Option<serde_json::Value>> {
        self.writer.with_conn_sync(|conn| {
            let Some(text) = entity_ops::get_entity(conn, id)? else {
                return Ok(None);
            };
            match serde_json::from_str(&text) {
                Ok(value) => Ok(Some(value)),
                Err(e) => {
                    warn!(id = %id, error = %e, "stored entity body does not parse");
                    audit(
                        conn,
                        &id.to_string(),
                        AuditAction::Error,
                        serde_json::json!({"type": "corrupt_body", "value": e.to_string()}),
                    )?;
                    Err(ConceptDbError::Storage(StorageError::CorruptionDetected {
                        details: format!("entity {id}: {e}"),
                    }))
                }
            }
        })
    }

    fn entity_ids(&self, kind: EntityKind) -> ConceptDbResult<Vec<ReasonId>> {
        self.writer
            .with_conn_sync(|conn| entity_ops::entity_ids(conn, kind))
    }
}

impl IAuditLog for StorageEngine {
    fn append(&self, entry: &AuditEntry) -> ConceptDbResult<()> {
        self.writer
            .with_conn_sync(|conn| audit_ops::insert_entry(conn, entry))
    }

    fn for_object(&self, object_id: &str) -> ConceptDbResult<Vec<AuditEntry>> {
        self.writer
            .with_conn_sync(|conn| audit_ops::entries_for(conn, object_id))
    }
}
