//! Electrical relaxation.
//!
//! Every edge is a conductor and every node is tied to ground. A unit current
//! is injected at the root and the node potentials are solved from
//! `AᵀGA x = e_root`, then normalised so the root sits at 1. Conjunction legs
//! have their conductance scaled by the current potentials of their group,
//! so the solve is repeated until the potentials stop moving.
//!
//! Opposing edges use the signed-Laplacian convention: both endpoints get
//! the same sign in the incidence row, which keeps `AᵀGA` positive
//! semi-definite and pushes the two potentials toward opposite signs.

use tracing::{debug, instrument, trace};

use conceptdb_core::config::{PropagationConfig, Strategy};
use conceptdb_core::errors::ConceptDbResult;
use conceptdb_core::ReasonId;

use crate::conjunction::electrical_multipliers;
use crate::engine::ReliabilityEstimator;
use crate::graph::BeliefGraph;
use crate::outcome::{PropagationOutcome, PropagationWarning, Warnings};
use crate::sparse::{conjugate_gradient, distance, CsrMatrix, WeightedNormal};

use super::{root_index, CancelFlag};

#[derive(Debug, Clone, Default)]
pub struct ElectricalEstimator {
    config: PropagationConfig,
    cancel: CancelFlag,
}

impl ElectricalEstimator {
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

/// Incidence matrix with one row per non-loop edge followed by one ground
/// row per node.
struct Circuit {
    incidence: CsrMatrix,
    transposed: CsrMatrix,
    /// `(row, edge)` for each edge row.
    edge_rows: Vec<(usize, usize)>,
}

impl Circuit {
    fn new(graph: &BeliefGraph) -> Self {
        let n = graph.node_count();
        let mut triplets = Vec::with_capacity(2 * graph.edge_count() + n);
        let mut edge_rows = Vec::with_capacity(graph.edge_count());
        for (e, (s, t, data)) in graph.edges().enumerate() {
            if s == t {
                continue;
            }
            let row = edge_rows.len();
            let source_sign = if data.weight < 0.0 { 1.0 } else { -1.0 };
            triplets.push((row, s, source_sign));
            triplets.push((row, t, 1.0));
            edge_rows.push((row, e));
        }
        let ground_start = edge_rows.len();
        for i in 0..n {
            triplets.push((ground_start + i, i, -1.0));
        }
        let incidence = CsrMatrix::from_triplets(ground_start + n, n, triplets);
        let transposed = incidence.transpose();
        Self {
            incidence,
            transposed,
            edge_rows,
        }
    }

    fn conductances(&self, graph: &BeliefGraph, multipliers: &[f64], ground_weight: f64) -> Vec<f64> {
        let mut g = vec![ground_weight; self.incidence.rows()];
        for &(row, e) in &self.edge_rows {
            let weight = graph.edge(e).map(|(_, _, d)| d.weight).unwrap_or(0.0);
            g[row] = weight.abs() * multipliers[e];
        }
        g
    }
}

impl ReliabilityEstimator for ElectricalEstimator {
    fn strategy(&self) -> Strategy {
        Strategy::Electrical
    }

    #[instrument(skip_all, fields(root = %root, nodes = graph.node_count(), edges = graph.edge_count()))]
    fn estimate_reliability(
        &self,
        graph: &BeliefGraph,
        root: &ReasonId,
    ) -> ConceptDbResult<PropagationOutcome> {
        self.config.validate()?;
        let root_at = root_index(graph, root)?;
        let n = graph.node_count();
        let circuit = Circuit::new(graph);
        let solver_cap = (10 * n).max(100);

        let mut potentials = vec![1.0; n];
        let mut degraded = vec![false; n];
        let mut warnings = Warnings::default();
        let mut converged = false;
        let mut stopped = false;
        let mut iterations = 0;
        let mut delta = f64::INFINITY;

        for iteration in 1..=self.config.max_iterations {
            iterations = iteration;
            let multipliers = electrical_multipliers(graph, &potentials);
            let g = circuit.conductances(graph, &multipliers, self.config.ground_weight);

            let pinned: Vec<bool> = circuit
                .incidence
                .gram_diagonal(&g)
                .iter()
                .map(|&d| !d.is_finite() || d <= 0.0)
                .collect();
            for (i, &p) in pinned.iter().enumerate() {
                if p && !degraded[i] {
                    degraded[i] = true;
                    warnings.push(PropagationWarning::DegradedNode {
                        node: graph.node(i).to_string(),
                        reason: "no conductance to any node or ground; pinned at 0".into(),
                    });
                }
            }
            if pinned[root_at] {
                warnings.push(PropagationWarning::SingularSystem {
                    iteration,
                    detail: "root has no conductance".into(),
                });
                stopped = true;
                break;
            }

            let mut current = vec![0.0; n];
            current[root_at] = 1.0;
            let op = WeightedNormal::new(&circuit.incidence, &circuit.transposed, &g, &pinned);
            let solution =
                match conjugate_gradient(&op, &current, self.config.solver_tolerance, solver_cap) {
                    Ok(solution) => solution,
                    Err(e) => {
                        warnings.push(PropagationWarning::SingularSystem {
                            iteration,
                            detail: e.to_string(),
                        });
                        stopped = true;
                        break;
                    }
                };

            let scale = solution.x[root_at];
            if !scale.is_finite() || scale <= 0.0 {
                warnings.push(PropagationWarning::SingularSystem {
                    iteration,
                    detail: format!("root potential {scale} is not positive"),
                });
                stopped = true;
                break;
            }
            let next: Vec<f64> = solution.x.iter().map(|v| v / scale).collect();
            delta = distance(&next, &potentials);
            potentials = next;
            trace!(iteration, delta, solver_steps = solution.iterations, "relaxation step");

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
        debug!(iterations, converged, delta, "electrical relaxation finished");

        Ok(PropagationOutcome {
            strategy: Strategy::Electrical,
            root: root.clone(),
            scores: graph.nodes().cloned().zip(potentials).collect(),
            converged,
            iterations,
            final_delta: delta,
            warnings: warnings.into_vec(),
        })
    }
}
