//! Subcommand implementations. Each returns the text to print.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::info;

use conceptdb_core::config::{Strategy, StorageConfig};
use conceptdb_core::{ConceptDbConfig, ReasonId};
use conceptdb_justify::JustificationEngine;
use conceptdb_propagation::graph::io::{load_graph, read_graph, save_graph};
use conceptdb_propagation::{BeliefGraph, GraphBuilder, PropagationEngine, PropagationOutcome};
use conceptdb_storage::StorageEngine;

/// The eight-node worked example: two supports of different strength, an
/// opposing pair, and two conjunctions.
pub const DEMO_GRAPH: &str = "\
root\tA\t{'weight': 1.0}
root\tB\t{'weight': 3.0}
A\tC\t{'weight': -1.0}
B\tC\t{'weight': 1.0}
A\tD\t{'weight': 1.0, 'dependencies': ['A', 'B']}
B\tD\t{'weight': 1.0, 'dependencies': ['A', 'B']}
A\tE\t{'weight': 1.0}
B\tE\t{'weight': 1.0}
C\tF\t{'weight': 1.0, 'dependencies': ['C', 'G']}
G\tF\t{'weight': 1.0, 'dependencies': ['C', 'G']}
B\tG\t{'weight': -1.0}
";

/// Where `propagate` gets its graph.
#[derive(Debug, Clone)]
pub enum GraphSource {
    File(PathBuf),
    Store(PathBuf),
}

#[derive(Debug, Clone)]
pub struct PropagateArgs {
    pub source: GraphSource,
    pub root: String,
    pub strategy: Option<Strategy>,
    pub write_back: bool,
    pub json: bool,
    pub top: Option<usize>,
}

fn open_store(config: &ConceptDbConfig, db: &Path) -> Result<StorageEngine> {
    let storage = StorageConfig {
        db_path: db.display().to_string(),
        ..config.storage.clone()
    };
    StorageEngine::open_with_config(&storage)
        .with_context(|| format!("opening database {}", db.display()))
}

/// Run every strategy over the built-in example graph.
pub fn demo(config: &ConceptDbConfig) -> Result<String> {
    let graph = read_graph(DEMO_GRAPH.as_bytes()).context("parsing the demo graph")?;
    let root = ReasonId::parse("root");
    let engine = PropagationEngine::new();

    let mut out = String::new();
    for strategy in [Strategy::Electrical, Strategy::Corona, Strategy::Spreading] {
        let mut propagation = config.propagation.clone();
        propagation.strategy = strategy;
        let outcome = engine.run(&graph, &root, &propagation)?;
        render(&mut out, &outcome, None);
        out.push('\n');
    }
    Ok(out)
}

pub fn build_graph(
    config: &ConceptDbConfig,
    db: &Path,
    out: &Path,
    reason_nodes: bool,
    min_degree: usize,
) -> Result<String> {
    let store = open_store(config, db)?;
    let graph = GraphBuilder::new()
        .with_reason_nodes(reason_nodes)
        .min_degree(min_degree)
        .build(&store)?;
    save_graph(&graph, out).with_context(|| format!("writing {}", out.display()))?;
    info!(nodes = graph.node_count(), edges = graph.edge_count(), "graph written");
    Ok(format!(
        "wrote {} nodes and {} edges to {}\n",
        graph.node_count(),
        graph.edge_count(),
        out.display()
    ))
}

pub fn propagate(config: &ConceptDbConfig, args: &PropagateArgs) -> Result<String> {
    let mut propagation = config.propagation.clone();
    if let Some(strategy) = args.strategy {
        propagation.strategy = strategy;
    }
    let root = ReasonId::parse(&args.root);
    let engine = PropagationEngine::new();

    let outcome = match &args.source {
        GraphSource::File(path) => {
            if args.write_back {
                bail!("--write-back needs --db");
            }
            let graph: BeliefGraph = load_graph(path)?;
            engine.run(&graph, &root, &propagation)?
        }
        GraphSource::Store(db) => {
            let store = open_store(config, db)?;
            if args.write_back {
                engine.propagate_store(&store, &store, &root, &propagation)?
            } else {
                let graph = GraphBuilder::new().build(&store)?;
                engine.run(&graph, &root, &propagation)?
            }
        }
    };

    if args.json {
        let mut text = serde_json::to_string_pretty(&outcome)?;
        text.push('\n');
        return Ok(text);
    }
    let mut out = String::new();
    render(&mut out, &outcome, args.top);
    if args.write_back {
        let _ = writeln!(out, "stored {} confidences", outcome.scores.len());
    }
    Ok(out)
}

/// Stored confidence of `id`, or the local vote estimate with `local`.
pub fn confidence(config: &ConceptDbConfig, db: &Path, id: &str, local: bool) -> Result<String> {
    let store = Arc::new(open_store(config, db)?);
    let engine = JustificationEngine::from_store(store).with_config(config.confidence.clone());
    let id = ReasonId::parse(id);
    let value = if local {
        engine.calculate(&id)?
    } else {
        engine.confidence(&id)?.value()
    };
    Ok(format!("{id}\t{value:.6}\n"))
}

fn render(out: &mut String, outcome: &PropagationOutcome, top: Option<usize>) {
    let status = if outcome.converged {
        "converged"
    } else {
        "stopped"
    };
    let _ = writeln!(
        out,
        "{} from {}: {status} after {} iterations (delta {:.3e})",
        outcome.strategy, outcome.root, outcome.iterations, outcome.final_delta
    );
    let ranked = outcome.ranked();
    let shown = top.unwrap_or(ranked.len()).min(ranked.len());
    for (id, score) in &ranked[..shown] {
        let _ = writeln!(out, "  {score:>10.6}  {id}");
    }
    for warning in &outcome.warnings {
        let _ = writeln!(out, "  warning: {warning}");
    }
}
