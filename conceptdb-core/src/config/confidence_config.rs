use serde::{Deserialize, Serialize};

use super::defaults;

/// Local confidence aggregation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConfidenceConfig {
    /// Confidence of an id nothing has been said about.
    pub default_confidence: f64,
    /// Prior weight given to `default_confidence` by `calculate`.
    pub default_weight: f64,
    /// Fail on unresolvable factors instead of assuming `default_confidence`.
    pub strict_lookup: bool,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            default_confidence: defaults::DEFAULT_CONFIDENCE,
            default_weight: defaults::DEFAULT_WEIGHT,
            strict_lookup: defaults::DEFAULT_STRICT_LOOKUP,
        }
    }
}
