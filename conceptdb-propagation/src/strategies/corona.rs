//! CORONA: hub and authority scores from seeded random walks.
//!
//! Every iteration starts one walk up (toward justifiers) and one walk down
//! (toward what a node justifies) from each node. Each later step picks its
//! direction at random, and the next hop is drawn with probability
//! proportional to the positive weight of the candidate edges. Up-visits
//! feed the hub score, down-visits the authority score; visit counts
//! accumulate across iterations.

use petgraph::Direction;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument, trace};

use conceptdb_core::config::{PropagationConfig, Strategy};
use conceptdb_core::errors::ConceptDbResult;
use conceptdb_core::ReasonId;

use crate::conjunction::corona_multipliers;
use crate::engine::ReliabilityEstimator;
use crate::graph::BeliefGraph;
use crate::outcome::{PropagationOutcome, PropagationWarning, Warnings};
use crate::sparse::distance;

use super::{root_index, CancelFlag};

#[derive(Debug, Clone, Default)]
pub struct CoronaEstimator {
    config: PropagationConfig,
    cancel: CancelFlag,
}

impl CoronaEstimator {
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Walk {
    Up,
    Down,
}

/// Adjacency lists of edge positions, built once per run.
struct Neighbourhood {
    incoming: Vec<Vec<usize>>,
    outgoing: Vec<Vec<usize>>,
    endpoints: Vec<(usize, usize)>,
}

impl Neighbourhood {
    fn new(graph: &BeliefGraph) -> Self {
        let n = graph.node_count();
        Self {
            incoming: (0..n)
                .map(|i| graph.incident_edges(i, Direction::Incoming))
                .collect(),
            outgoing: (0..n)
                .map(|i| graph.incident_edges(i, Direction::Outgoing))
                .collect(),
            endpoints: graph.edges().map(|(s, t, _)| (s, t)).collect(),
        }
    }
}

struct Walker<'a> {
    around: &'a Neighbourhood,
    /// Instantaneous edge weights for this iteration.
    weights: &'a [f64],
    depth: usize,
    steps_up: &'a mut [u64],
    steps_down: &'a mut [u64],
}

impl Walker<'_> {
    fn walk(&mut self, rng: &mut ChaCha8Rng, start: usize, first: Walk) {
        let mut here = start;
        let mut direction = first;
        for step in 0..self.depth {
            if step > 0 {
                direction = if rng.gen_bool(0.5) { Walk::Up } else { Walk::Down };
            }
            let candidates = match direction {
                Walk::Up => &self.around.incoming[here],
                Walk::Down => &self.around.outgoing[here],
            };
            let total: f64 = candidates
                .iter()
                .map(|&e| self.weights[e])
                .filter(|&w| w > 0.0)
                .sum();
            if total <= 0.0 {
                return;
            }
            let Some(edge) = pick(candidates, self.weights, rng.gen::<f64>() * total) else {
                return;
            };
            let (source, target) = self.around.endpoints[edge];
            match direction {
                Walk::Up => {
                    here = source;
                    self.steps_up[here] += 1;
                }
                Walk::Down => {
                    here = target;
                    self.steps_down[here] += 1;
                }
            }
        }
    }
}

/// First positive-weight edge whose running total exceeds `draw`, falling
/// back to the last positive one.
fn pick(candidates: &[usize], weights: &[f64], draw: f64) -> Option<usize> {
    let mut running = 0.0;
    let mut last = None;
    for &e in candidates {
        let w = weights[e];
        if w <= 0.0 {
            continue;
        }
        running += w;
        last = Some(e);
        if draw < running {
            return Some(e);
        }
    }
    last
}

fn shares(counts: &[u64]) -> Vec<f64> {
    let total: u64 = counts.iter().sum();
    if total == 0 {
        return vec![0.0; counts.len()];
    }
    counts.iter().map(|&c| c as f64 / total as f64).collect()
}

impl ReliabilityEstimator for CoronaEstimator {
    fn strategy(&self) -> Strategy {
        Strategy::Corona
    }

    #[instrument(skip_all, fields(root = %root, nodes = graph.node_count(), seed = self.config.seed))]
    fn estimate_reliability(
        &self,
        graph: &BeliefGraph,
        root: &ReasonId,
    ) -> ConceptDbResult<PropagationOutcome> {
        self.config.validate()?;
        // The walks start everywhere; the root is only checked for presence.
        root_index(graph, root)?;
        let n = graph.node_count();
        let around = Neighbourhood::new(graph);
        let base: Vec<f64> = graph.edges().map(|(_, _, d)| d.weight).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);

        let mut hub = vec![1.0 / n as f64; n];
        let mut authority = vec![0.0; n];
        let mut scores: Vec<f64> = hub.iter().map(|h| h / 2.0).collect();
        let mut steps_up = vec![0u64; n];
        let mut steps_down = vec![0u64; n];

        let mut warnings = Warnings::default();
        let mut converged = false;
        let mut cancelled = false;
        let mut iterations = 0;
        let mut delta = f64::INFINITY;

        for iteration in 1..=self.config.max_iterations {
            iterations = iteration;
            let node_weights: Vec<f64> = hub.iter().zip(&authority).map(|(h, a)| h + a).collect();
            let weights: Vec<f64> = corona_multipliers(graph, &node_weights)
                .into_iter()
                .zip(&base)
                .map(|(m, b)| b * m)
                .collect();

            let mut walker = Walker {
                around: &around,
                weights: &weights,
                depth: self.config.walk_depth,
                steps_up: &mut steps_up,
                steps_down: &mut steps_down,
            };
            for node in 0..n {
                walker.walk(&mut rng, node, Walk::Up);
                walker.walk(&mut rng, node, Walk::Down);
            }

            hub = shares(&steps_up);
            authority = shares(&steps_down);
            let next: Vec<f64> = hub.iter().zip(&authority).map(|(h, a)| (h + a) / 2.0).collect();
            delta = distance(&next, &scores);
            scores = next;
            trace!(iteration, delta, "walk round");

            if delta < self.config.epsilon {
                converged = true;
                break;
            }
            if self.cancel.is_cancelled() {
                warnings.push(PropagationWarning::Cancelled { iteration });
                cancelled = true;
                break;
            }
        }

        if !converged && !cancelled {
            warnings.push(PropagationWarning::NotConverged { iterations, delta });
        }
        debug!(iterations, converged, delta, "corona finished");

        Ok(PropagationOutcome {
            strategy: Strategy::Corona,
            root: root.clone(),
            scores: graph.nodes().cloned().zip(scores).collect(),
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

    #[test]
    fn pick_skips_non_positive_weights() {
        let weights = [0.0, -1.0, 2.0, 1.0];
        assert_eq!(pick(&[0, 1, 2, 3], &weights, 0.5), Some(2));
        assert_eq!(pick(&[0, 1, 2, 3], &weights, 2.5), Some(3));
        assert_eq!(pick(&[0, 1, 2, 3], &weights, 3.0), Some(3));
        assert_eq!(pick(&[0, 1], &weights, 0.0), None);
    }

    #[test]
    fn shares_of_nothing_are_zero() {
        assert_eq!(shares(&[0, 0]), vec![0.0, 0.0]);
        assert_eq!(shares(&[1, 3]), vec![0.25, 0.75]);
    }
}
