//! Reliability estimators.

mod corona;
mod electrical;
mod spreading;

pub use corona::CoronaEstimator;
pub use electrical::ElectricalEstimator;
pub use spreading::SpreadingEstimator;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use conceptdb_core::errors::{ConceptDbResult, PropagationError};
use conceptdb_core::ReasonId;

use crate::graph::BeliefGraph;

/// Shared stop signal. Checked between iterations.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Option<Arc<AtomicBool>>);

impl CancelFlag {
    pub fn new(flag: Arc<AtomicBool>) -> Self {
        Self(Some(flag))
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.as_ref().is_some_and(|f| f.load(Ordering::Relaxed))
    }
}

/// Position of `root`, rejecting empty graphs and unknown roots.
pub(crate) fn root_index(graph: &BeliefGraph, root: &ReasonId) -> ConceptDbResult<usize> {
    if graph.is_empty() {
        return Err(PropagationError::EmptyGraph.into());
    }
    graph.node_index(root).ok_or_else(|| {
        PropagationError::UnknownRoot {
            root: root.to_string(),
        }
        .into()
    })
}
