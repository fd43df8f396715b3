//! Propagation over the 8-node demo graph and over graphs built from storage:
//! convergence, determinism, degraded runs, graph files and write-back.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use proptest::prelude::*;

use conceptdb_core::config::{PropagationConfig, Strategy as Method};
use conceptdb_core::errors::PropagationError;
use conceptdb_core::traits::{IConfidenceStorage, IReasonStorage};
use conceptdb_core::{ConceptDbError, ReasonId};
use conceptdb_propagation::graph::io::{load_graph, read_graph, save_graph};
use conceptdb_propagation::{
    BeliefGraph, CoronaEstimator, EdgeSpec, GraphBuilder, PropagationEngine, PropagationWarning,
    ReliabilityEstimator,
};
use conceptdb_storage::StorageEngine;

fn demo() -> BeliefGraph {
    load_graph(&test_fixtures::fixture_path("golden/graphs/demo.graph")).unwrap()
}

fn id(name: &str) -> ReasonId {
    ReasonId::parse(name)
}

fn config(strategy: Method) -> PropagationConfig {
    PropagationConfig {
        strategy,
        ..PropagationConfig::default()
    }
}

// ── Demo graph ────────────────────────────────────────────────────────────

#[test]
fn demo_graph_shape() {
    let g = demo();
    assert_eq!(g.node_count(), 8);
    assert_eq!(g.edge_count(), 11);
    assert_eq!(g.groups().len(), 2);
}

#[test]
fn electrical_converges_on_demo() {
    let outcome = PropagationEngine::new()
        .run(&demo(), &id("root"), &config(Method::Electrical))
        .unwrap();

    assert!(outcome.converged, "{:?}", outcome.warnings);
    assert!(outcome.iterations <= 100);
    assert!(outcome.final_delta < 1e-6);
    assert!(outcome.warnings.is_empty());

    let score = |n: &str| outcome.get(&id(n)).unwrap();
    assert_eq!(score("root"), 1.0);
    assert!(score("B") > score("A"));
    assert!(score("A") > 0.0);
    assert!(score("C") > 0.0);
    assert!(score("D") > 0.0);
    assert!(score("E") > 0.0);
    assert!(score("G") < 0.0, "opposed node should go negative");
    // F's conjunction includes the negative G, so it carries nothing.
    assert!(score("F").abs() < 1e-12);
}

#[test]
fn electrical_rerun_is_bit_identical() {
    let engine = PropagationEngine::new();
    let g = demo();
    let first = engine.run(&g, &id("root"), &config(Method::Electrical)).unwrap();
    let second = engine.run(&g, &id("root"), &config(Method::Electrical)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn spreading_converges_on_demo() {
    let outcome = PropagationEngine::new()
        .run(&demo(), &id("root"), &config(Method::Spreading))
        .unwrap();

    assert!(outcome.converged, "{:?}", outcome.warnings);
    assert!(outcome.get(&id("root")).unwrap() >= 0.0);
    let peak = outcome
        .scores
        .iter()
        .map(|(_, s)| *s)
        .fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(peak, 1.0);
    assert!(outcome.get(&id("G")).unwrap() < 0.0);

    let again = PropagationEngine::new()
        .run(&demo(), &id("root"), &config(Method::Spreading))
        .unwrap();
    assert_eq!(outcome, again);
}

#[test]
fn corona_is_deterministic_for_a_seed() {
    let g = demo();
    let seeded = |seed| PropagationConfig {
        strategy: Method::Corona,
        seed,
        max_iterations: 20,
        ..PropagationConfig::default()
    };
    let engine = PropagationEngine::new();
    let a = engine.run(&g, &id("root"), &seeded(7)).unwrap();
    let b = engine.run(&g, &id("root"), &seeded(7)).unwrap();
    assert_eq!(a, b);
    for (_, score) in &a.scores {
        assert!((0.0..=1.0).contains(score));
    }
}

#[test]
fn corona_single_edge_splits_hub_and_authority() {
    let g = BeliefGraph::from_edges([EdgeSpec::new("root", "A", 1.0)]);
    let estimator = CoronaEstimator::new(config(Method::Corona));
    assert_eq!(estimator.name(), "corona");

    let outcome = estimator.estimate_reliability(&g, &id("root")).unwrap();
    assert!(outcome.converged);
    assert_eq!(outcome.iterations, 2);
    assert_eq!(outcome.get(&id("root")), Some(0.5));
    assert_eq!(outcome.get(&id("A")), Some(0.5));
}

// ── Degraded and rejected runs ────────────────────────────────────────────

#[test]
fn zero_ground_path_is_singular_and_keeps_previous_potentials() {
    let g = BeliefGraph::from_edges([EdgeSpec::new("root", "A", 1.0), EdgeSpec::new("A", "B", 1.0)]);
    let cfg = PropagationConfig {
        ground_weight: 0.0,
        ..PropagationConfig::default()
    };
    let outcome = PropagationEngine::new().run(&g, &id("root"), &cfg).unwrap();

    assert!(!outcome.converged);
    assert!(outcome.has_warning(|w| matches!(w, PropagationWarning::SingularSystem { iteration: 1, .. })));
    assert!(outcome.scores.iter().all(|(_, s)| *s == 1.0));
}

#[test]
fn isolated_node_without_ground_is_pinned() {
    // "z" only appears as a conjunction member, so it has no edge of its own.
    let g = BeliefGraph::from_edges([
        EdgeSpec::new("root", "a", 1.0),
        EdgeSpec::new("a", "b", 1.0).with_dependencies(["a", "z"]),
    ]);
    let cfg = PropagationConfig {
        ground_weight: 0.0,
        ..PropagationConfig::default()
    };
    let outcome = PropagationEngine::new().run(&g, &id("root"), &cfg).unwrap();
    assert!(outcome.has_warning(
        |w| matches!(w, PropagationWarning::DegradedNode { node, .. } if node == "z")
    ));
    // Without ground the rest of the system is singular too, so every node
    // keeps its starting potential.
    assert!(outcome.has_warning(|w| matches!(w, PropagationWarning::SingularSystem { .. })));
    assert_eq!(outcome.get(&id("z")), Some(1.0));
}

#[test]
fn unknown_root_and_empty_graph_are_errors() {
    let engine = PropagationEngine::new();
    let err = engine
        .run(&demo(), &id("nobody"), &PropagationConfig::default())
        .unwrap_err();
    assert!(matches!(
        err,
        ConceptDbError::Propagation(PropagationError::UnknownRoot { .. })
    ));

    let empty = BeliefGraph::from_edges(Vec::new());
    let err = engine
        .run(&empty, &id("root"), &PropagationConfig::default())
        .unwrap_err();
    assert!(matches!(
        err,
        ConceptDbError::Propagation(PropagationError::EmptyGraph)
    ));
}

#[test]
fn invalid_config_is_rejected() {
    let cfg = PropagationConfig {
        epsilon: 0.0,
        ..PropagationConfig::default()
    };
    let err = PropagationEngine::new()
        .run(&demo(), &id("root"), &cfg)
        .unwrap_err();
    assert!(matches!(
        err,
        ConceptDbError::Propagation(PropagationError::InvalidConfig { .. })
    ));
}

#[test]
fn cancelled_run_stops_after_first_iteration() {
    let flag = Arc::new(AtomicBool::new(true));
    let engine = PropagationEngine::new().with_cancel_flag(flag);
    for strategy in [Method::Electrical, Method::Corona, Method::Spreading] {
        let outcome = engine.run(&demo(), &id("root"), &config(strategy)).unwrap();
        assert!(!outcome.converged, "{strategy}");
        assert_eq!(outcome.iterations, 1);
        assert_eq!(
            outcome.warnings,
            vec![PropagationWarning::Cancelled { iteration: 1 }]
        );
    }
}

#[test]
fn iteration_cap_reports_not_converged() {
    let cfg = PropagationConfig {
        max_iterations: 2,
        ..PropagationConfig::default()
    };
    let outcome = PropagationEngine::new().run(&demo(), &id("root"), &cfg).unwrap();
    assert!(!outcome.converged);
    assert_eq!(outcome.iterations, 2);
    assert!(outcome.has_warning(|w| matches!(w, PropagationWarning::NotConverged { iterations: 2, .. })));
}

// ── Graph files ───────────────────────────────────────────────────────────

#[test]
fn graph_file_round_trip() {
    let g = demo();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("copy.graph");
    save_graph(&g, &path).unwrap();
    let back = load_graph(&path).unwrap();

    assert_eq!(back.to_edge_specs(), g.to_edge_specs());
    assert_eq!(back.groups().len(), g.groups().len());
    let names: Vec<&ReasonId> = back.nodes().collect();
    assert_eq!(names, g.nodes().collect::<Vec<_>>());
}

#[test]
fn bad_graph_line_names_its_line() {
    let text = "root\tA\t{'weight': 1.0}\nA\tB\t{'weight': oops}\n";
    let err = read_graph(text.as_bytes()).unwrap_err();
    assert!(matches!(
        err,
        ConceptDbError::Propagation(PropagationError::GraphFormat { line: 2, .. })
    ));
}

// ── From storage ──────────────────────────────────────────────────────────

fn seeded_store() -> StorageEngine {
    let store = StorageEngine::open_in_memory().unwrap();
    let root = id("/data/test/root");
    store.make(&id("/assertion/a"), &[root.clone()], 1.0, 1.0).unwrap();
    store.make(&id("/assertion/b"), &[id("/assertion/a")], 1.0, 0.5).unwrap();
    store.make(&id("/assertion/c"), &[id("/assertion/a")], 0.0, 1.0).unwrap();
    store
        .make(&id("/assertion/d"), &[root, id("/assertion/b")], 1.0, 1.0)
        .unwrap();
    store
}

#[test]
fn builder_reads_every_record() {
    let store = seeded_store();
    let g = GraphBuilder::new().build(&store).unwrap();
    assert_eq!(g.node_count(), 5);
    assert_eq!(g.edge_count(), 5);
    assert_eq!(g.groups().len(), 1);
    let opposed = g.find_edge(&id("/assertion/a"), &id("/assertion/c")).unwrap();
    assert_eq!(g.edge(opposed).unwrap().2.weight, -1.0);

    let with_nodes = GraphBuilder::new().with_reason_nodes(true).build(&store).unwrap();
    assert_eq!(with_nodes.node_count(), 5 + store.count().unwrap());
}

#[test]
fn propagate_store_writes_clamped_scores() {
    let store = seeded_store();
    let outcome = PropagationEngine::new()
        .propagate_store(&store, &store, &id("/data/test/root"), &PropagationConfig::default())
        .unwrap();
    assert!(outcome.converged);

    assert_eq!(store.get(&id("/data/test/root")).unwrap().value(), 1.0);
    let a = store.get(&id("/assertion/a")).unwrap().value();
    let b = store.get(&id("/assertion/b")).unwrap().value();
    assert!(a > b && b > 0.0, "a={a} b={b}");
    assert!(outcome.get(&id("/assertion/c")).unwrap() < 0.0);
    assert_eq!(store.get(&id("/assertion/c")).unwrap().value(), 0.0);
    assert_eq!(store.confidence_count().unwrap(), outcome.scores.len());
}

#[test]
fn adding_a_supporting_conjunction_never_lowers_the_target() {
    let store = StorageEngine::open_in_memory().unwrap();
    store.make(&id("a"), &[id("root")], 1.0, 1.0).unwrap();
    store.make(&id("b"), &[id("root")], 0.0, 1.0).unwrap();
    store.make(&id("t"), &[id("a")], 1.0, 1.0).unwrap();

    let engine = PropagationEngine::new();
    let config = PropagationConfig::default();
    let score_t = |store: &StorageEngine| {
        let g = GraphBuilder::new().build(store).unwrap();
        let outcome = engine.run(&g, &id("root"), &config).unwrap();
        assert!(outcome.converged, "{:?}", outcome.warnings);
        (g, outcome.get(&id("t")).unwrap())
    };

    let (_, before) = score_t(&store);
    assert!(before > 0.0);

    store.make(&id("t"), &[id("a"), id("b")], 1.0, 1.0).unwrap();
    let (g, after) = score_t(&store);
    assert_eq!(g.find_edges(&id("a"), &id("t")).len(), 2);
    assert_eq!(g.groups().len(), 1);
    assert!(after >= before - 1e-9, "before={before} after={after}");
}

// ── Properties ────────────────────────────────────────────────────────────

/// Up to twelve edges among six nodes, always reachable from "n0".
fn small_graph() -> impl Strategy<Value = Vec<(usize, usize, f64)>> {
    prop::collection::vec((0usize..6, 0usize..6, -2.0..2.0f64), 1..12)
}

proptest! {
    #[test]
    fn grounded_electrical_is_finite_and_anchored(edges in small_graph()) {
        let mut specs = vec![EdgeSpec::new("n0", "n1", 1.0)];
        specs.extend(
            edges
                .into_iter()
                .map(|(s, t, w)| EdgeSpec::new(format!("n{s}").as_str(), format!("n{t}").as_str(), w)),
        );
        let g = BeliefGraph::from_edges(specs);
        let outcome = PropagationEngine::new()
            .run(&g, &id("n0"), &PropagationConfig::default())
            .unwrap();
        prop_assert!(outcome.converged);
        prop_assert_eq!(outcome.get(&id("n0")), Some(1.0));
        prop_assert!(outcome.scores.iter().all(|(_, s)| s.is_finite()));
    }
}
