use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::defaults;
use crate::errors::PropagationError;

/// Which reliability estimator the propagation engine runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Iterated resistor-network relaxation.
    #[default]
    Electrical,
    /// Random-walk hub/authority estimation.
    Corona,
    /// Trust-network spreading activation.
    Spreading,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Electrical => "electrical",
            Self::Corona => "corona",
            Self::Spreading => "spreading",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = PropagationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "electrical" => Ok(Self::Electrical),
            "corona" => Ok(Self::Corona),
            "spreading" => Ok(Self::Spreading),
            other => Err(PropagationError::InvalidConfig {
                reason: format!("unknown strategy '{other}'"),
            }),
        }
    }
}

/// Graph propagation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PropagationConfig {
    pub strategy: Strategy,
    /// Conductance tying every node to ground.
    pub ground_weight: f64,
    /// Convergence threshold on the change between iterations.
    pub epsilon: f64,
    pub max_iterations: usize,
    /// Seed for the random-walk strategy.
    pub seed: u64,
    /// Maximum number of steps in one random walk.
    pub walk_depth: usize,
    /// Relative residual at which the linear solve stops.
    pub solver_tolerance: f64,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            ground_weight: defaults::DEFAULT_GROUND_WEIGHT,
            epsilon: defaults::DEFAULT_EPSILON,
            max_iterations: defaults::DEFAULT_MAX_ITERATIONS,
            seed: defaults::DEFAULT_SEED,
            walk_depth: defaults::DEFAULT_WALK_DEPTH,
            solver_tolerance: defaults::DEFAULT_SOLVER_TOLERANCE,
        }
    }
}

impl PropagationConfig {
    /// Reject settings no strategy can run with.
    pub fn validate(&self) -> Result<(), PropagationError> {
        let invalid = |reason: &str| {
            Err(PropagationError::InvalidConfig {
                reason: reason.to_string(),
            })
        };
        if !self.ground_weight.is_finite() || self.ground_weight < 0.0 {
            return invalid("ground_weight must be finite and non-negative");
        }
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return invalid("epsilon must be finite and positive");
        }
        if self.max_iterations == 0 {
            return invalid("max_iterations must be at least 1");
        }
        if self.walk_depth == 0 {
            return invalid("walk_depth must be at least 1");
        }
        if !self.solver_tolerance.is_finite() || self.solver_tolerance <= 0.0 {
            return invalid("solver_tolerance must be finite and positive");
        }
        Ok(())
    }
}
