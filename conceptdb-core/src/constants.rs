/// ConceptDB version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Confidence assumed for a node nobody has scored yet ("maximally uncertain").
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Prior weight paired with [`DEFAULT_CONFIDENCE`] in the local aggregator.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Vote cast by a supporting reason.
pub const SUPPORT_VOTE: f64 = 1.0;

/// Vote cast by an opposing reason.
pub const OPPOSE_VOTE: f64 = 0.0;

/// Iteration cap for every propagation strategy.
pub const MAX_PROPAGATION_ITERATIONS: usize = 100;

/// Default convergence threshold for propagation.
pub const DEFAULT_EPSILON: f64 = 1e-6;

/// Default conductance of each node's tie to ground.
pub const DEFAULT_GROUND_WEIGHT: f64 = 1.0;

/// Maximum hops in a single CORONA walk.
pub const DEFAULT_WALK_DEPTH: usize = 20;

/// Name of the synthetic reference node in the electrical analogy.
pub const GROUND_NODE: &str = "~ground~";

/// Placeholder argument marking an unfilled slot in an assertion.
pub const BLANK: &str = "*";
