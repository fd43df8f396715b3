//! Conjunction coupling.
//!
//! An edge that is one leg of a conjunction only carries as much as the
//! whole conjunction is believed. Each strategy scales such edges by a
//! multiplier computed from the current state of every factor in the group;
//! plain edges keep a multiplier of 1.

use conceptdb_core::confidence::combine::{clamp_unit, hamacher, parallel};

use crate::graph::{BeliefGraph, ConjunctionGroup};

/// Floor applied to activations before the parallel combination.
pub const ACTIVATION_FLOOR: f64 = 1e-6;

/// Hamacher product of the clamped factor potentials, or 0 if any factor
/// potential is not positive.
pub fn group_strength(group: &ConjunctionGroup, potentials: &[f64]) -> f64 {
    if !group.sources.iter().all(|&s| potentials[s] > 0.0) {
        return 0.0;
    }
    hamacher(group.sources.iter().map(|&s| clamp_unit(potentials[s])))
}

/// Per-edge conductance multipliers for the electrical strategy:
/// `group_strength / clamp(potential of the edge source)`.
pub fn electrical_multipliers(graph: &BeliefGraph, potentials: &[f64]) -> Vec<f64> {
    let mut multipliers = vec![1.0; graph.edge_count()];
    for group in graph.groups() {
        let strength = group_strength(group, potentials);
        for &e in &group.edges {
            let Some((source, _, _)) = graph.edge(e) else {
                continue;
            };
            let own = clamp_unit(potentials[source]);
            multipliers[e] = if strength > 0.0 && own > 0.0 {
                strength / own
            } else {
                0.0
            };
        }
    }
    multipliers
}

/// Per-edge multipliers for CORONA walks:
/// `parallel(node weights of the group) / node weight of the edge source`,
/// 0 if any group member has weight ≤ 0.
pub fn corona_multipliers(graph: &BeliefGraph, node_weights: &[f64]) -> Vec<f64> {
    let mut multipliers = vec![1.0; graph.edge_count()];
    for group in graph.groups() {
        let dead = !group.sources.iter().all(|&s| node_weights[s] > 0.0);
        let combined = if dead {
            0.0
        } else {
            parallel(group.sources.iter().map(|&s| node_weights[s]))
        };
        for &e in &group.edges {
            let Some((source, _, _)) = graph.edge(e) else {
                continue;
            };
            let baseline = node_weights[source];
            multipliers[e] = if combined > 0.0 && baseline > 0.0 {
                combined / baseline
            } else {
                0.0
            };
        }
    }
    multipliers
}

/// Per-node factor for spreading activation. For each group into a node,
/// `min(1, parallel(max(floor, v_s)) / Σ v_s)`, or 0 when the sum is not
/// positive; a node takes the smallest factor over its groups, and nodes
/// with no incoming group keep 1.
pub fn spreading_factors(graph: &BeliefGraph, activations: &[f64]) -> Vec<f64> {
    let mut factors = vec![1.0_f64; graph.node_count()];
    for group in graph.groups() {
        let sum: f64 = group.sources.iter().map(|&s| activations[s]).sum();
        let factor = if sum > 0.0 {
            let combined = parallel(
                group
                    .sources
                    .iter()
                    .map(|&s| activations[s].max(ACTIVATION_FLOOR)),
            );
            (combined / sum).min(1.0)
        } else {
            0.0
        };
        let slot = &mut factors[group.target];
        *slot = f64::min(*slot, factor);
    }
    factors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EdgeSpec;
    use conceptdb_core::ReasonId;

    /// Two groups: {a, b} → x and {c, d} → y, plus a plain edge a → y.
    fn two_groups() -> BeliefGraph {
        BeliefGraph::from_edges([
            EdgeSpec::new("a", "x", 1.0).with_dependencies(["a", "b"]),
            EdgeSpec::new("b", "x", 1.0).with_dependencies(["a", "b"]),
            EdgeSpec::new("c", "y", 1.0).with_dependencies(["c", "d"]),
            EdgeSpec::new("d", "y", 1.0).with_dependencies(["c", "d"]),
            EdgeSpec::new("a", "y", 1.0),
        ])
    }

    fn at(graph: &BeliefGraph, name: &str) -> usize {
        graph.node_index(&ReasonId::parse(name)).unwrap()
    }

    fn edge(graph: &BeliefGraph, s: &str, t: &str) -> usize {
        graph
            .find_edge(&ReasonId::parse(s), &ReasonId::parse(t))
            .unwrap()
    }

    #[test]
    fn zeroing_a_factor_zeroes_only_its_group() {
        let g = two_groups();
        let mut v = vec![0.8; g.node_count()];
        v[at(&g, "b")] = 0.0;

        let m = electrical_multipliers(&g, &v);
        assert_eq!(m[edge(&g, "a", "x")], 0.0);
        assert_eq!(m[edge(&g, "b", "x")], 0.0);
        assert!(m[edge(&g, "c", "y")] > 0.0);
        assert!(m[edge(&g, "d", "y")] > 0.0);
        assert_eq!(m[edge(&g, "a", "y")], 1.0);

        let c = corona_multipliers(&g, &v);
        assert_eq!(c[edge(&g, "a", "x")], 0.0);
        assert!(c[edge(&g, "c", "y")] > 0.0);
        assert_eq!(c[edge(&g, "a", "y")], 1.0);
    }

    #[test]
    fn raising_every_factor_raises_group_strength() {
        let g = two_groups();
        let group = &g.groups()[0];
        let low = vec![0.3; g.node_count()];
        let high = vec![0.6; g.node_count()];
        assert!(group_strength(group, &high) > group_strength(group, &low));
    }

    #[test]
    fn electrical_multiplier_is_strength_over_own_potential() {
        let g = two_groups();
        let mut v = vec![1.0; g.node_count()];
        v[at(&g, "a")] = 0.5;
        v[at(&g, "b")] = 0.5;
        let m = electrical_multipliers(&g, &v);
        // hamacher(0.5, 0.5) = 1/3, divided by 0.5.
        assert!((m[edge(&g, "a", "x")] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn corona_multiplier_uses_parallel_weights() {
        let g = two_groups();
        let v = vec![0.5; g.node_count()];
        let m = corona_multipliers(&g, &v);
        // parallel(0.5, 0.5) = 0.25, divided by 0.5.
        assert!((m[edge(&g, "c", "y")] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn spreading_factor_takes_the_weakest_group() {
        let g = two_groups();
        let mut v = vec![1.0; g.node_count()];
        let f = spreading_factors(&g, &v);
        // parallel(1, 1) / 2 = 0.25
        assert!((f[at(&g, "x")] - 0.25).abs() < 1e-12);
        assert_eq!(f[at(&g, "a")], 1.0);

        v[at(&g, "c")] = -1.0;
        v[at(&g, "d")] = 0.5;
        let f = spreading_factors(&g, &v);
        assert_eq!(f[at(&g, "y")], 0.0);
    }
}
