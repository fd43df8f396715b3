//! Storage tests: reason upsert semantics, confidence defaults, entity bodies,
//! audit trail, migrations and file persistence.

use std::sync::Arc;
use std::thread;

use proptest::prelude::*;

use conceptdb_core::models::AuditAction;
use conceptdb_core::traits::{IAuditLog, IConfidenceStorage, IEntityStorage, IReasonStorage};
use conceptdb_core::{Confidence, EntityKind, Polarity, ReasonId, ReasonRecord};
use conceptdb_storage::migrations::LATEST_VERSION;
use conceptdb_storage::StorageEngine;

fn ids(names: &[&str]) -> Vec<ReasonId> {
    names.iter().map(|n| ReasonId::parse(n)).collect()
}

// ── Reason upsert ─────────────────────────────────────────────────────────

#[test]
fn make_twice_keeps_one_record_with_latest_weight() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let target = ReasonId::assertion("a1");
    let factors = ids(&["/data/test/root", "/assertion/a2"]);

    let first = engine.make(&target, &factors, 1.0, 0.4).unwrap();
    let second = engine.make(&target, &factors, 1.0, 0.9).unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(engine.count().unwrap(), 1);
    let stored = engine.by_target(&target).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].weight, 0.9);
    assert_eq!(stored[0].created_at, first.created_at);
}

#[test]
fn factor_order_does_not_change_identity() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let target = ReasonId::assertion("a1");

    engine
        .make(&target, &ids(&["/assertion/x", "/assertion/y"]), 1.0, 1.0)
        .unwrap();
    engine
        .make(&target, &ids(&["/assertion/y", "/assertion/x"]), 0.0, 0.5)
        .unwrap();

    let stored = engine.by_target(&target).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].polarity, Polarity::Oppose);
    assert_eq!(stored[0].factors, ids(&["/assertion/y", "/assertion/x"]));
}

#[test]
fn record_id_matches_model() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let target = ReasonId::assertion("a1");
    let factors = ids(&["/assertion/b"]);
    let record = engine.make(&target, &factors, 1.0, 1.0).unwrap();
    assert_eq!(record.id, ReasonRecord::record_id(&target, &factors));
    assert_eq!(engine.get_reason(&record.id).unwrap(), Some(record));
}

#[test]
fn by_factor_finds_every_target() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let shared = ReasonId::external("test", "contributor/alice");
    engine
        .make(&ReasonId::assertion("a"), &[shared.clone()], 1.0, 1.0)
        .unwrap();
    engine
        .make(
            &ReasonId::assertion("b"),
            &[shared.clone(), ReasonId::assertion("a")],
            1.0,
            1.0,
        )
        .unwrap();
    engine
        .make(&ReasonId::assertion("c"), &ids(&["/assertion/a"]), 1.0, 1.0)
        .unwrap();

    let targets: Vec<ReasonId> = engine
        .by_factor(&shared)
        .unwrap()
        .into_iter()
        .map(|r| r.target)
        .collect();
    assert_eq!(targets, vec![ReasonId::assertion("a"), ReasonId::assertion("b")]);
}

#[test]
fn all_is_ordered_by_target() {
    let engine = StorageEngine::open_in_memory().unwrap();
    for name in ["/assertion/z", "/assertion/a", "/assertion/m"] {
        engine
            .make(&ReasonId::parse(name), &ids(&["root"]), 1.0, 1.0)
            .unwrap();
    }
    let targets: Vec<String> = engine
        .all()
        .unwrap()
        .iter()
        .map(|r| r.target.to_string())
        .collect();
    assert_eq!(targets, ["/assertion/a", "/assertion/m", "/assertion/z"]);
}

#[test]
fn make_rejects_bad_arguments() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let target = ReasonId::assertion("a");
    assert!(engine.make(&target, &[], 1.0, 1.0).is_err());
    assert!(engine.make(&target, &ids(&["root"]), 1.5, 1.0).is_err());
    assert!(engine.make(&target, &ids(&["root"]), f64::NAN, 1.0).is_err());
    assert!(engine.make(&target, &ids(&["root"]), 1.0, f64::INFINITY).is_err());
    assert_eq!(engine.count().unwrap(), 0);
}

#[test]
fn concurrent_make_leaves_one_record() {
    let engine = Arc::new(StorageEngine::open_in_memory().unwrap());
    let target = ReasonId::assertion("contended");
    let factors = ids(&["/assertion/p", "/assertion/q"]);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let engine = Arc::clone(&engine);
            let target = target.clone();
            let factors = factors.clone();
            thread::spawn(move || {
                for j in 0..10 {
                    let weight = (i * 10 + j) as f64 / 100.0;
                    engine.make(&target, &factors, 1.0, weight).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(engine.count().unwrap(), 1);
}

// ── Confidence values ─────────────────────────────────────────────────────

#[test]
fn missing_confidence_is_neutral() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let id = ReasonId::assertion("unknown");
    assert_eq!(engine.get(&id).unwrap().value(), 0.5);
    assert_eq!(engine.get_stored(&id).unwrap(), None);
}

#[test]
fn last_confidence_write_wins() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let id = ReasonId::assertion("a");
    engine.set(&id, Confidence::new(0.2)).unwrap();
    engine.set(&id, Confidence::new(0.75)).unwrap();
    assert_eq!(engine.get(&id).unwrap().value(), 0.75);
    assert_eq!(engine.confidence_count().unwrap(), 1);
}

#[test]
fn set_many_writes_all_values() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let values: Vec<(ReasonId, Confidence)> = (0..5)
        .map(|i| (ReasonId::assertion(format!("n{i}")), Confidence::new(i as f64 / 4.0)))
        .collect();
    assert_eq!(engine.set_many(&values).unwrap(), 5);
    assert_eq!(engine.get(&ReasonId::assertion("n4")).unwrap().value(), 1.0);
    assert_eq!(engine.get(&ReasonId::assertion("n2")).unwrap().value(), 0.5);
}

// ── Entities and audit trail ──────────────────────────────────────────────

#[test]
fn entity_body_round_trips() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let id = ReasonId::assertion("abc");
    let body = serde_json::json!({"relation": "IsA", "arguments": ["dog", "animal"]});

    engine.save_entity(&id, &body).unwrap();
    assert_eq!(engine.load_entity(&id).unwrap(), Some(body));
    assert_eq!(engine.entity_ids(EntityKind::Assertion).unwrap(), vec![id]);
    assert!(engine.entity_ids(EntityKind::Sentence).unwrap().is_empty());
    assert_eq!(engine.load_entity(&ReasonId::assertion("nope")).unwrap(), None);
}

#[test]
fn saves_are_audited_as_create_then_update() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let id = ReasonId::sentence("s1");
    engine.save_entity(&id, &serde_json::json!({"text": "a"})).unwrap();
    engine.save_entity(&id, &serde_json::json!({"text": "b"})).unwrap();

    let actions: Vec<AuditAction> = engine
        .for_object(&id.to_string())
        .unwrap()
        .into_iter()
        .map(|e| e.action)
        .collect();
    assert_eq!(actions, vec![AuditAction::Create, AuditAction::Update]);
}

#[test]
fn reason_upserts_are_audited_under_node_id() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let record = engine
        .make(&ReasonId::assertion("a"), &ids(&["root"]), 1.0, 1.0)
        .unwrap();
    engine
        .make(&ReasonId::assertion("a"), &ids(&["root"]), 1.0, 0.5)
        .unwrap();

    let entries = engine.for_object(&record.node_id().to_string()).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].action, AuditAction::Update);
    assert_eq!(entries[1].data["weight"], 0.5);
}

// ── Migrations and persistence ────────────────────────────────────────────

#[test]
fn fresh_database_is_at_latest_version() {
    let engine = StorageEngine::open_in_memory().unwrap();
    assert_eq!(engine.schema_version().unwrap(), LATEST_VERSION);
    engine.integrity_check().unwrap();
}

#[test]
fn reopening_file_keeps_data_and_schema() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("concepts.db");
    let target = ReasonId::assertion("kept");

    {
        let engine = StorageEngine::open(&path).unwrap();
        engine.make(&target, &ids(&["root"]), 1.0, 0.8).unwrap();
        engine.set(&target, Confidence::new(0.9)).unwrap();
    }

    let engine = StorageEngine::open(&path).unwrap();
    assert_eq!(engine.schema_version().unwrap(), LATEST_VERSION);
    assert_eq!(engine.by_target(&target).unwrap()[0].weight, 0.8);
    assert_eq!(engine.get(&target).unwrap().value(), 0.9);
}

#[test]
fn corrupt_entity_body_is_reported_and_logged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt.db");
    let id = ReasonId::assertion("broken");

    {
        let engine = StorageEngine::open(&path).unwrap();
        engine.save_entity(&id, &serde_json::json!({"ok": true})).unwrap();
    }
    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute(
            "UPDATE entities SET body = '{not json' WHERE id = ?1",
            [id.to_string()],
        )
        .unwrap();
    }

    let engine = StorageEngine::open(&path).unwrap();
    assert!(engine.load_entity(&id).is_err());
    let last = engine.for_object(&id.to_string()).unwrap().pop().unwrap();
    assert_eq!(last.action, AuditAction::Error);
}

// ── Properties ────────────────────────────────────────────────────────────

/// A set of distinct factor names paired with a shuffled copy of it.
fn factor_orders() -> impl Strategy<Value = (Vec<String>, Vec<String>)> {
    prop::collection::btree_set("[a-z]{1,6}", 1..6).prop_flat_map(|names| {
        let names: Vec<String> = names.into_iter().collect();
        (Just(names.clone()), Just(names).prop_shuffle())
    })
}

proptest! {
    #[test]
    fn any_factor_order_makes_one_record((given, shuffled) in factor_orders()) {
        let engine = StorageEngine::open_in_memory().unwrap();
        let target = ReasonId::assertion("target-0");
        let as_ids = |names: &[String]| -> Vec<ReasonId> {
            names.iter().map(ReasonId::assertion).collect()
        };

        let first = engine.make(&target, &as_ids(&given), 1.0, 0.5).unwrap();
        let second = engine.make(&target, &as_ids(&shuffled), 0.0, 0.8).unwrap();

        prop_assert_eq!(&first.id, &second.id);
        prop_assert_eq!(engine.count().unwrap(), 1);
        let stored = engine.by_target(&target).unwrap();
        prop_assert_eq!(stored.len(), 1);
        prop_assert_eq!(stored[0].weight, 0.8);
    }
}
