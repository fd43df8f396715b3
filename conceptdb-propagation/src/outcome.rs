//! Result of one propagation run.

use serde::Serialize;
use tracing::warn;

use conceptdb_core::config::Strategy;
use conceptdb_core::ReasonId;

/// Recoverable trouble inside a run. The run still returns scores.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PropagationWarning {
    #[error("no convergence after {iterations} iterations (last change {delta:e})")]
    NotConverged { iterations: usize, delta: f64 },

    #[error("singular system at iteration {iteration}: {detail}")]
    SingularSystem { iteration: usize, detail: String },

    #[error("node {node} degraded: {reason}")]
    DegradedNode { node: String, reason: String },

    #[error("cancelled after iteration {iteration}")]
    Cancelled { iteration: usize },
}

/// Scores by node plus how the run ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropagationOutcome {
    pub strategy: Strategy,
    pub root: ReasonId,
    /// One score per graph node, in node order.
    pub scores: Vec<(ReasonId, f64)>,
    pub converged: bool,
    pub iterations: usize,
    /// Change between the last two iterations.
    pub final_delta: f64,
    pub warnings: Vec<PropagationWarning>,
}

impl PropagationOutcome {
    pub fn get(&self, id: &ReasonId) -> Option<f64> {
        self.scores.iter().find(|(n, _)| n == id).map(|(_, s)| *s)
    }

    pub fn has_warning(&self, pred: impl Fn(&PropagationWarning) -> bool) -> bool {
        self.warnings.iter().any(pred)
    }

    /// Scores sorted from highest to lowest, ties by node order.
    pub fn ranked(&self) -> Vec<(ReasonId, f64)> {
        let mut ranked = self.scores.clone();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}

/// Collects warnings for a run, logging each as it arrives.
#[derive(Debug, Default)]
pub(crate) struct Warnings(Vec<PropagationWarning>);

impl Warnings {
    pub(crate) fn push(&mut self, warning: PropagationWarning) {
        warn!(%warning, "propagation degraded");
        self.0.push(warning);
    }

    pub(crate) fn into_vec(self) -> Vec<PropagationWarning> {
        self.0
    }
}
