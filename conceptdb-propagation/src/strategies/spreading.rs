//! Trust-network spreading activation.
//!
//! `v ← (M v) ∘ f(v) + v`, where `M` is the symmetric weighted adjacency and
//! `f` damps nodes fed by conjunctions. After each step the vector is
//! flipped if the root went negative and rescaled so its largest entry is 1.

use tracing::{debug, instrument, trace};

use conceptdb_core::config::{PropagationConfig, Strategy};
use conceptdb_core::errors::ConceptDbResult;
use conceptdb_core::ReasonId;

use crate::conjunction::spreading_factors;
use crate::engine::ReliabilityEstimator;
use crate::graph::BeliefGraph;
use crate::outcome::{PropagationOutcome, PropagationWarning, Warnings};
use crate::sparse::CsrMatrix;

use super::{root_index, CancelFlag};

#[derive(Debug, Clone, Default)]
pub struct SpreadingEstimator {
    config: PropagationConfig,
    cancel: CancelFlag,
}

impl SpreadingEstimator {
    pub fn new(config: PropagationConfig) -> Self {
        Self {
            config,
            cancel: CancelFlag::default(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Symmetric adjacency; self-loops are left out.
fn adjacency(graph: &BeliefGraph) -> CsrMatrix {
    let n = graph.node_count();
    let triplets = graph
        .edges()
        .filter(|(s, t, _)| s != t)
        .flat_map(|(s, t, d)| [(s, t, d.weight), (t, s, d.weight)]);
    CsrMatrix::from_triplets(n, n, triplets)
}

fn l1_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
}

impl ReliabilityEstimator for SpreadingEstimator {
    fn strategy(&self) -> Strategy {
        Strategy::Spreading
    }

    #[instrument(skip_all, fields(root = %root, nodes = graph.node_count()))]
    fn estimate_reliability(
        &self,
        graph: &BeliefGraph,
        root: &ReasonId,
    ) -> ConceptDbResult<PropagationOutcome> {
        self.config.validate()?;
        let root_at = root_index(graph, root)?;
        let matrix = adjacency(graph);

        let mut activation = vec![1.0; graph.node_count()];
        let mut warnings = Warnings::default();
        let mut converged = false;
        let mut stopped = false;
        let mut iterations = 0;
        let mut delta = f64::INFINITY;

        for iteration in 1..=self.config.max_iterations {
            iterations = iteration;
            let factors = spreading_factors(graph, &activation);
            let spread = matrix.mul_vec(&activation);
            let mut next: Vec<f64> = spread
                .iter()
                .zip(&factors)
                .zip(&activation)
                .map(|((m, f), v)| m * f + v)
                .collect();
            if next[root_at] < 0.0 {
                next.iter_mut().for_each(|v| *v = -*v);
            }
            let peak = next.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            if peak <= 0.0 || next.iter().any(|v| !v.is_finite()) {
                warnings.push(PropagationWarning::SingularSystem {
                    iteration,
                    detail: format!("activation peak {peak} cannot be normalised"),
                });
                stopped = true;
                break;
            }
            next.iter_mut().for_each(|v| *v /= peak);

            delta = l1_distance(&next, &activation);
            activation = next;
            trace!(iteration, delta, "spreading step");

            if delta < self.config.epsilon {
                converged = true;
                break;
            }
            if self.cancel.is_cancelled() {
                warnings.push(PropagationWarning::Cancelled { iteration });
                stopped = true;
                break;
            }
        }

        if !converged && !stopped {
            warnings.push(PropagationWarning::NotConverged { iterations, delta });
        }
        debug!(iterations, converged, delta, "spreading activation finished");

        Ok(PropagationOutcome {
            strategy: Strategy::Spreading,
            root: root.clone(),
            scores: graph.nodes().cloned().zip(activation).collect(),
            converged,
            iterations,
            final_delta: delta,
            warnings: warnings.into_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EdgeSpec;

    #[test]
    fn adjacency_is_symmetric_without_loops() {
        let g = BeliefGraph::from_edges([
            EdgeSpec::new("a", "b", 2.0),
            EdgeSpec::new("b", "b", 5.0),
        ]);
        let m = adjacency(&g);
        assert_eq!(m.mul_vec(&[1.0, 0.0]), vec![0.0, 2.0]);
        assert_eq!(m.mul_vec(&[0.0, 1.0]), vec![2.0, 0.0]);
    }
}
