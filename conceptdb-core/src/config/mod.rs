pub mod confidence_config;
pub mod defaults;
pub mod observability_config;
pub mod propagation_config;
pub mod storage_config;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use confidence_config::ConfidenceConfig;
pub use observability_config::ObservabilityConfig;
pub use propagation_config::{PropagationConfig, Strategy};
pub use storage_config::StorageConfig;

use crate::errors::{ConceptDbError, ConceptDbResult};

/// Top-level configuration aggregating all subsystem configs.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ConceptDbConfig {
    pub storage: StorageConfig,
    pub confidence: ConfidenceConfig,
    pub propagation: PropagationConfig,
    pub observability: ObservabilityConfig,
}

impl ConceptDbConfig {
    /// Load config from a TOML string, falling back to defaults for missing fields.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Read and parse a TOML file. Propagation settings are validated.
    pub fn from_file(path: impl AsRef<Path>) -> ConceptDbResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&text)
            .map_err(|e| ConceptDbError::Config(format!("{}: {e}", path.display())))?;
        config.propagation.validate()?;
        Ok(config)
    }
}
