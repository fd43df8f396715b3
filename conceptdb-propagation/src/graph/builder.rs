//! Reason records → belief graph.

use std::collections::HashMap;

use tracing::{debug, instrument};

use conceptdb_core::errors::ConceptDbResult;
use conceptdb_core::traits::IReasonStorage;
use conceptdb_core::{ReasonId, ReasonRecord};

use super::{BeliefGraph, EdgeSpec};

/// Turns the contents of a reason store into a [`BeliefGraph`].
///
/// By default each record `{f1..fk} → target` becomes edges `fi → target`
/// carrying the record's signed weight, grouped when `k > 1`.
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    reason_nodes: bool,
    min_degree: usize,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Materialise every record as its own `/c/<record-id>` node: factors
    /// point at the reason node with the record weight, and the reason node
    /// points at the target with +1 or -1.
    pub fn with_reason_nodes(mut self, enabled: bool) -> Self {
        self.reason_nodes = enabled;
        self
    }

    /// Skip records whose target or any factor appears in `n` records or fewer.
    pub fn min_degree(mut self, n: usize) -> Self {
        self.min_degree = n;
        self
    }

    /// Scan the whole store.
    #[instrument(skip(self, store))]
    pub fn build(&self, store: &dyn IReasonStorage) -> ConceptDbResult<BeliefGraph> {
        let records = store.all()?;
        Ok(self.build_from_records(&records))
    }

    pub fn build_from_records(&self, records: &[ReasonRecord]) -> BeliefGraph {
        let degree = self.degrees(records);
        let mut specs = Vec::new();
        let mut skipped = 0usize;

        for record in records {
            if self.min_degree > 0 && !self.well_connected(record, &degree) {
                skipped += 1;
                continue;
            }
            if self.reason_nodes {
                self.push_with_reason_node(record, &mut specs);
            } else {
                push_direct(record, &mut specs);
            }
        }

        let graph = BeliefGraph::from_edges(specs);
        debug!(
            records = records.len(),
            skipped,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            groups = graph.groups().len(),
            "built belief graph"
        );
        graph
    }

    /// Number of records each node takes part in, as target or factor.
    fn degrees<'a>(&self, records: &'a [ReasonRecord]) -> HashMap<&'a ReasonId, usize> {
        let mut degree: HashMap<&ReasonId, usize> = HashMap::new();
        if self.min_degree == 0 {
            return degree;
        }
        for record in records {
            *degree.entry(&record.target).or_default() += 1;
            let mut factors: Vec<&ReasonId> = record.factors.iter().collect();
            factors.sort();
            factors.dedup();
            for factor in factors {
                if factor != &record.target {
                    *degree.entry(factor).or_default() += 1;
                }
            }
        }
        degree
    }

    fn well_connected(&self, record: &ReasonRecord, degree: &HashMap<&ReasonId, usize>) -> bool {
        let seen = |id: &ReasonId| degree.get(id).copied().unwrap_or(0) > self.min_degree;
        seen(&record.target) && record.factors.iter().all(seen)
    }

    fn push_with_reason_node(&self, record: &ReasonRecord, specs: &mut Vec<EdgeSpec>) {
        let node = record.node_id();
        let dependencies = (record.factors.len() > 1).then(|| record.factors.clone());
        for factor in &record.factors {
            specs.push(EdgeSpec {
                source: factor.clone(),
                target: node.clone(),
                weight: record.weight.abs(),
                dependencies: dependencies.clone(),
            });
        }
        specs.push(EdgeSpec::new(
            node,
            record.target.clone(),
            record.polarity.sign(),
        ));
    }
}

fn push_direct(record: &ReasonRecord, specs: &mut Vec<EdgeSpec>) {
    let dependencies = (record.factors.len() > 1).then(|| record.factors.clone());
    for factor in &record.factors {
        specs.push(EdgeSpec {
            source: factor.clone(),
            target: record.target.clone(),
            weight: record.signed_weight(),
            dependencies: dependencies.clone(),
        });
    }
}
