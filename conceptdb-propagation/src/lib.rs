//! # conceptdb-propagation
//!
//! Global confidence for ConceptDB: reason records become a [`BeliefGraph`],
//! and a [`ReliabilityEstimator`] iterates over it until the node scores
//! settle. Three estimators share the same graph and outcome types:
//! electrical relaxation, CORONA random walks and spreading activation.

pub mod conjunction;
pub mod engine;
pub mod graph;
pub mod outcome;
pub mod sparse;
pub mod strategies;

pub use engine::{PropagationEngine, ReliabilityEstimator};
pub use graph::builder::GraphBuilder;
pub use graph::{BeliefGraph, ConjunctionGroup, EdgeData, EdgeSpec};
pub use outcome::{PropagationOutcome, PropagationWarning};
pub use strategies::{CancelFlag, CoronaEstimator, ElectricalEstimator, SpreadingEstimator};
