//! Belief graph: a petgraph `DiGraph` whose node and edge indices follow a
//! canonical order, plus the conjunction groups coupling edges into a node.

pub mod builder;
pub mod io;

use std::collections::{BTreeMap, HashMap};

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use conceptdb_core::ReasonId;

/// One edge as read from a dump or produced from a reason record.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeSpec {
    pub source: ReasonId,
    pub target: ReasonId,
    /// Negative for opposition.
    pub weight: f64,
    /// Every source of the conjunction this edge belongs to, when the edge
    /// is one leg of a conjunction.
    pub dependencies: Option<Vec<ReasonId>>,
}

impl EdgeSpec {
    pub fn new(source: impl Into<ReasonId>, target: impl Into<ReasonId>, weight: f64) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            weight,
            dependencies: None,
        }
    }

    pub fn with_dependencies<I, R>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<ReasonId>,
    {
        self.dependencies = Some(dependencies.into_iter().map(Into::into).collect());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeData {
    pub weight: f64,
    /// Index into [`BeliefGraph::groups`].
    pub group: Option<usize>,
}

/// Edges AND-coupled into one target.
#[derive(Debug, Clone, PartialEq)]
pub struct ConjunctionGroup {
    pub target: usize,
    /// Every factor of the conjunction, as sorted node positions.
    pub sources: Vec<usize>,
    /// Positions of the member edges present in the graph, in edge order.
    pub edges: Vec<usize>,
    /// The dependency list as written, kept for dumps.
    dependencies: Vec<ReasonId>,
}

impl ConjunctionGroup {
    pub fn dependencies(&self) -> &[ReasonId] {
        &self.dependencies
    }
}

/// Immutable snapshot the estimators run on.
///
/// Nodes are indexed in lexicographic order of their textual ids and edges
/// in (source, target, conjunction) order, so node `i` is row/column `i` of
/// every matrix built from the graph. A pair can carry one plain edge plus
/// one leg per conjunction it takes part in; the legs of different
/// conjunctions never merge.
#[derive(Debug, Clone)]
pub struct BeliefGraph {
    graph: DiGraph<ReasonId, EdgeData>,
    index: HashMap<ReasonId, NodeIndex>,
    groups: Vec<ConjunctionGroup>,
}

impl BeliefGraph {
    /// Build from edge specs. A later spec for the same (source, target,
    /// dependency set) replaces an earlier one. Dependency lists with fewer
    /// than two distinct members are treated as plain edges.
    pub fn from_edges<I>(specs: I) -> Self
    where
        I: IntoIterator<Item = EdgeSpec>,
    {
        let mut edges: BTreeMap<(String, String, Vec<String>), EdgeSpec> = BTreeMap::new();
        let mut names: BTreeMap<String, ReasonId> = BTreeMap::new();
        for spec in specs {
            names.insert(spec.source.to_string(), spec.source.clone());
            names.insert(spec.target.to_string(), spec.target.clone());
            for dep in spec.dependencies.iter().flatten() {
                names.insert(dep.to_string(), dep.clone());
            }
            let key = (
                spec.source.to_string(),
                spec.target.to_string(),
                conjunction_key(&spec),
            );
            edges.insert(key, spec);
        }

        let mut graph = DiGraph::with_capacity(names.len(), edges.len());
        let mut index = HashMap::with_capacity(names.len());
        let mut by_name = HashMap::with_capacity(names.len());
        for (name, id) in names {
            let node = graph.add_node(id.clone());
            index.insert(id, node);
            by_name.insert(name, node);
        }

        // Edges sharing a target and a dependency set form one group.
        let mut groups: Vec<ConjunctionGroup> = Vec::new();
        let mut group_of: BTreeMap<(usize, Vec<usize>), usize> = BTreeMap::new();
        for ((source, target, members), spec) in &edges {
            let (Some(&s), Some(&t)) = (by_name.get(source), by_name.get(target)) else {
                continue;
            };
            let group = spec
                .dependencies
                .as_ref()
                .filter(|_| !members.is_empty())
                .map(|deps| {
                    let sources: Vec<usize> = members
                        .iter()
                        .filter_map(|d| by_name.get(d).map(|n| n.index()))
                        .collect();
                    *group_of.entry((t.index(), sources.clone())).or_insert_with(|| {
                        groups.push(ConjunctionGroup {
                            target: t.index(),
                            sources,
                            edges: Vec::new(),
                            dependencies: deps.clone(),
                        });
                        groups.len() - 1
                    })
                });
            let edge = graph.add_edge(
                s,
                t,
                EdgeData {
                    weight: spec.weight,
                    group,
                },
            );
            if let Some(g) = group {
                groups[g].edges.push(edge.index());
            }
        }

        Self {
            graph,
            index,
            groups,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Position of `id` in the node order.
    pub fn node_index(&self, id: &ReasonId) -> Option<usize> {
        self.index.get(id).map(|n| n.index())
    }

    pub fn contains(&self, id: &ReasonId) -> bool {
        self.index.contains_key(id)
    }

    /// The id at position `i`.
    pub fn node(&self, i: usize) -> &ReasonId {
        &self.graph[NodeIndex::new(i)]
    }

    /// Node ids in index order.
    pub fn nodes(&self) -> impl Iterator<Item = &ReasonId> {
        self.graph.node_indices().map(move |n| &self.graph[n])
    }

    /// `(source, target, data)` by position, in edge order.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, &EdgeData)> {
        self.graph
            .edge_references()
            .map(|e| (e.source().index(), e.target().index(), e.weight()))
    }

    pub fn edge(&self, i: usize) -> Option<(usize, usize, &EdgeData)> {
        let e = EdgeIndex::new(i);
        let (s, t) = self.graph.edge_endpoints(e)?;
        Some((s.index(), t.index(), &self.graph[e]))
    }

    /// Lowest edge position of `source -> target`; the plain edge when the
    /// pair has one.
    pub fn find_edge(&self, source: &ReasonId, target: &ReasonId) -> Option<usize> {
        self.find_edges(source, target).into_iter().next()
    }

    /// Every edge position of `source -> target`, in edge order.
    pub fn find_edges(&self, source: &ReasonId, target: &ReasonId) -> Vec<usize> {
        let (Some(&s), Some(&t)) = (self.index.get(source), self.index.get(target)) else {
            return Vec::new();
        };
        let mut found: Vec<usize> = self
            .graph
            .edges_connecting(s, t)
            .map(|e| e.id().index())
            .collect();
        found.sort_unstable();
        found
    }

    pub fn groups(&self) -> &[ConjunctionGroup] {
        &self.groups
    }

    /// Positions of edges leaving (`Outgoing`) or entering (`Incoming`)
    /// node `i`, in edge order.
    pub fn incident_edges(&self, i: usize, direction: Direction) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .graph
            .edges_directed(NodeIndex::new(i), direction)
            .map(|e| e.id().index())
            .collect();
        out.sort_unstable();
        out
    }

    /// Edge specs in edge order, the inverse of [`BeliefGraph::from_edges`].
    pub fn to_edge_specs(&self) -> Vec<EdgeSpec> {
        self.graph
            .edge_references()
            .map(|e| EdgeSpec {
                source: self.graph[e.source()].clone(),
                target: self.graph[e.target()].clone(),
                weight: e.weight().weight,
                dependencies: e
                    .weight()
                    .group
                    .map(|g| self.groups[g].dependencies.clone()),
            })
            .collect()
    }
}

/// Sorted distinct dependency names, empty for a plain edge.
fn conjunction_key(spec: &EdgeSpec) -> Vec<String> {
    let mut members: Vec<String> = spec
        .dependencies
        .iter()
        .flatten()
        .map(ToString::to_string)
        .collect();
    members.sort();
    members.dedup();
    if members.len() < 2 {
        members.clear();
    }
    members
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ReasonId {
        ReasonId::parse(s)
    }

    #[test]
    fn nodes_are_sorted_and_edges_follow() {
        let g = BeliefGraph::from_edges([
            EdgeSpec::new("b", "a", 1.0),
            EdgeSpec::new("root", "b", 2.0),
            EdgeSpec::new("a", "c", -1.0),
        ]);
        let names: Vec<String> = g.nodes().map(ToString::to_string).collect();
        assert_eq!(names, ["a", "b", "c", "root"]);
        let edges: Vec<(usize, usize, f64)> = g.edges().map(|(s, t, d)| (s, t, d.weight)).collect();
        assert_eq!(edges, vec![(0, 2, -1.0), (1, 0, 1.0), (3, 1, 2.0)]);
    }

    #[test]
    fn conjunction_legs_share_a_group() {
        let g = BeliefGraph::from_edges([
            EdgeSpec::new("A", "D", 1.0).with_dependencies(["A", "B"]),
            EdgeSpec::new("B", "D", 1.0).with_dependencies(["B", "A"]),
            EdgeSpec::new("A", "E", 1.0),
        ]);
        assert_eq!(g.groups().len(), 1);
        let group = &g.groups()[0];
        assert_eq!(g.node(group.target), &id("D"));
        assert_eq!(group.sources.len(), 2);
        assert_eq!(group.edges.len(), 2);
        let plain = g.find_edge(&id("A"), &id("E")).unwrap();
        assert_eq!(g.edge(plain).unwrap().2.group, None);
    }

    #[test]
    fn later_spec_replaces_earlier() {
        let g = BeliefGraph::from_edges([EdgeSpec::new("x", "y", 1.0), EdgeSpec::new("x", "y", 0.25)]);
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.edge(0).unwrap().2.weight, 0.25);
    }

    #[test]
    fn plain_edge_and_conjunction_legs_coexist() {
        let g = BeliefGraph::from_edges([
            EdgeSpec::new("a", "t", 1.0),
            EdgeSpec::new("a", "t", 0.5).with_dependencies(["a", "b"]),
            EdgeSpec::new("b", "t", 0.5).with_dependencies(["a", "b"]),
            EdgeSpec::new("a", "t", 0.25).with_dependencies(["a", "c"]),
            EdgeSpec::new("c", "t", 0.25).with_dependencies(["c", "a"]),
        ]);
        assert_eq!(g.edge_count(), 5);
        assert_eq!(g.groups().len(), 2);

        let legs = g.find_edges(&id("a"), &id("t"));
        assert_eq!(legs.len(), 3);
        let plain = g.find_edge(&id("a"), &id("t")).unwrap();
        assert_eq!(plain, legs[0]);
        assert_eq!(g.edge(plain).unwrap().2.group, None);
        assert_eq!(g.edge(plain).unwrap().2.weight, 1.0);

        let round_trip = BeliefGraph::from_edges(g.to_edge_specs());
        assert_eq!(round_trip.edge_count(), 5);
        assert_eq!(round_trip.groups(), g.groups());
    }

    #[test]
    fn single_dependency_is_a_plain_edge() {
        let g = BeliefGraph::from_edges([EdgeSpec::new("x", "y", 1.0).with_dependencies(["x"])]);
        assert!(g.groups().is_empty());
    }

    #[test]
    fn dependency_only_nodes_are_indexed() {
        let g = BeliefGraph::from_edges([EdgeSpec::new("A", "D", 1.0).with_dependencies(["A", "Z"])]);
        assert!(g.contains(&id("Z")));
        assert_eq!(g.groups()[0].sources.len(), 2);
        assert_eq!(g.groups()[0].edges.len(), 1);
    }
}
