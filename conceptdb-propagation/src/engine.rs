//! Propagation engine: picks an estimator, runs it, writes results back.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tracing::{info, instrument};

use conceptdb_core::config::{PropagationConfig, Strategy};
use conceptdb_core::confidence::combine::clamp_unit;
use conceptdb_core::errors::ConceptDbResult;
use conceptdb_core::traits::{IConfidenceStorage, IReasonStorage};
use conceptdb_core::{Confidence, ReasonId};

use crate::graph::builder::GraphBuilder;
use crate::graph::BeliefGraph;
use crate::outcome::PropagationOutcome;
use crate::strategies::{CancelFlag, CoronaEstimator, ElectricalEstimator, SpreadingEstimator};

/// A global scoring method over a belief graph.
pub trait ReliabilityEstimator: Send + Sync {
    fn strategy(&self) -> Strategy;

    fn name(&self) -> &'static str {
        self.strategy().as_str()
    }

    /// Score every node of `graph` relative to `root`. Numerical trouble is
    /// reported through the outcome's warnings; only bad input is an error.
    fn estimate_reliability(
        &self,
        graph: &BeliefGraph,
        root: &ReasonId,
    ) -> ConceptDbResult<PropagationOutcome>;
}

#[derive(Debug, Clone, Default)]
pub struct PropagationEngine {
    builder: GraphBuilder,
    cancel: CancelFlag,
}

impl PropagationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder used by [`PropagationEngine::propagate_store`].
    pub fn with_builder(mut self, builder: GraphBuilder) -> Self {
        self.builder = builder;
        self
    }

    /// Stop runs after the current iteration once `flag` is set.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = CancelFlag::new(flag);
        self
    }

    /// The estimator `config.strategy` names.
    pub fn estimator(&self, config: &PropagationConfig) -> Box<dyn ReliabilityEstimator> {
        let config = config.clone();
        let cancel = self.cancel.clone();
        match config.strategy {
            Strategy::Electrical => Box::new(ElectricalEstimator::new(config).with_cancel(cancel)),
            Strategy::Corona => Box::new(CoronaEstimator::new(config).with_cancel(cancel)),
            Strategy::Spreading => Box::new(SpreadingEstimator::new(config).with_cancel(cancel)),
        }
    }

    #[instrument(skip(self, graph, config), fields(strategy = %config.strategy, root = %root))]
    pub fn run(
        &self,
        graph: &BeliefGraph,
        root: &ReasonId,
        config: &PropagationConfig,
    ) -> ConceptDbResult<PropagationOutcome> {
        config.validate()?;
        let outcome = self.estimator(config).estimate_reliability(graph, root)?;
        info!(
            converged = outcome.converged,
            iterations = outcome.iterations,
            warnings = outcome.warnings.len(),
            "propagation finished"
        );
        Ok(outcome)
    }

    /// Store every score, clamped to [0, 1]. Returns the number written.
    pub fn write_back(
        &self,
        outcome: &PropagationOutcome,
        store: &dyn IConfidenceStorage,
    ) -> ConceptDbResult<usize> {
        let values: Vec<(ReasonId, Confidence)> = outcome
            .scores
            .iter()
            .map(|(id, score)| (id.clone(), Confidence::new(clamp_unit(*score))))
            .collect();
        store.set_many(&values)
    }

    /// Build a graph from `reasons`, run it, and write the scores into
    /// `confidences`.
    #[instrument(skip_all, fields(root = %root))]
    pub fn propagate_store(
        &self,
        reasons: &dyn IReasonStorage,
        confidences: &dyn IConfidenceStorage,
        root: &ReasonId,
        config: &PropagationConfig,
    ) -> ConceptDbResult<PropagationOutcome> {
        let graph = self.builder.build(reasons)?;
        let outcome = self.run(&graph, root, config)?;
        let written = self.write_back(&outcome, confidences)?;
        info!(written, "confidences updated");
        Ok(outcome)
    }
}
