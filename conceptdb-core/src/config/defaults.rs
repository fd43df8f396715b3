//! Default values for every config field.

use crate::constants;

// Storage
pub const DEFAULT_DB_PATH: &str = "conceptdb.db";
pub const DEFAULT_WAL_MODE: bool = true;
pub const DEFAULT_CACHE_SIZE: i64 = -16_000;
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

// Confidence
pub const DEFAULT_CONFIDENCE: f64 = constants::DEFAULT_CONFIDENCE;
pub const DEFAULT_WEIGHT: f64 = constants::DEFAULT_WEIGHT;
pub const DEFAULT_STRICT_LOOKUP: bool = false;

// Propagation
pub const DEFAULT_GROUND_WEIGHT: f64 = constants::DEFAULT_GROUND_WEIGHT;
pub const DEFAULT_EPSILON: f64 = constants::DEFAULT_EPSILON;
pub const DEFAULT_MAX_ITERATIONS: usize = constants::MAX_PROPAGATION_ITERATIONS;
pub const DEFAULT_SEED: u64 = 0;
pub const DEFAULT_WALK_DEPTH: usize = constants::DEFAULT_WALK_DEPTH;
pub const DEFAULT_SOLVER_TOLERANCE: f64 = 1e-12;

// Observability
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_JSON_LOGS: bool = false;
