use serde::{Deserialize, Serialize};

use conceptdb_core::errors::{ConceptDbResult, ConsistencyError};
use conceptdb_core::ReasonId;

const DATA_PREFIX: &str = "/data/";

/// A named source of assertions, e.g. `/data/conceptnet`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dataset {
    pub name: String,
    pub language: Option<String>,
}

impl Dataset {
    /// `name` may be given with or without the `/data/` prefix.
    pub fn new(name: &str, language: Option<&str>) -> Self {
        let name = if name.starts_with(DATA_PREFIX) {
            name.to_string()
        } else {
            format!("{DATA_PREFIX}{}", name.trim_start_matches('/'))
        };
        Self {
            name,
            language: language.map(str::to_string),
        }
    }

    /// The name without its `/data/` prefix.
    pub fn short_name(&self) -> &str {
        self.name.strip_prefix(DATA_PREFIX).unwrap_or(&self.name)
    }

    /// The id of an external reason belonging to this dataset.
    pub fn reason(&self, suffix: &str) -> ReasonId {
        ReasonId::parse(&format!("{}/{}", self.name, suffix.trim_start_matches('/')))
    }

    /// Every reason in the dataset ultimately derives from this one.
    pub fn root_reason(&self) -> ReasonId {
        self.reason("root")
    }

    pub fn check_consistency(&self) -> ConceptDbResult<()> {
        if !self.name.starts_with(DATA_PREFIX) || self.short_name().is_empty() {
            return Err(ConsistencyError::Entity {
                entity: self.name.clone(),
                details: "dataset names must look like /data/<name>".to_string(),
            }
            .into());
        }
        Ok(())
    }
}
