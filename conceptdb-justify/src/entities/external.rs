use serde::{Deserialize, Serialize};

use conceptdb_core::errors::ConceptDbResult;
use conceptdb_core::{Confidence, EntityKind, ReasonId};

use super::dataset::Dataset;
use crate::factor::Factor;
use crate::justification::Justification;
use crate::justified::{Entity, Justified};

/// A reason that originates outside the database: a contributor, a site,
/// an activity, a rule. Lives under `/data/<dataset>/<suffix>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalReason {
    pub dataset: String,
    pub suffix: String,
    #[serde(default)]
    pub justification: Justification,
    #[serde(default)]
    pub confidence: f64,
}

impl ExternalReason {
    pub fn new(dataset: &Dataset, suffix: &str) -> Self {
        Self {
            dataset: dataset.name.clone(),
            suffix: suffix.trim_start_matches('/').to_string(),
            justification: Justification::empty(),
            confidence: 0.0,
        }
    }

    /// The dataset's root reason, trusted completely.
    pub fn root(dataset: &Dataset) -> Self {
        let mut root = Self::new(dataset, "root");
        root.confidence = 1.0;
        root
    }

    /// A sibling reason in the same dataset, justified by this one, whose
    /// confidence starts at `reliability`.
    pub fn derived(&self, suffix: &str, reliability: f64) -> ConceptDbResult<Self> {
        let mut child = Self {
            dataset: self.dataset.clone(),
            suffix: suffix.trim_start_matches('/').to_string(),
            justification: Justification::empty(),
            confidence: Confidence::new(reliability).value(),
        };
        child.add_support(vec![Factor::of(self, 1.0)])?;
        Ok(child)
    }
}

impl Justified for ExternalReason {
    fn reason_id(&self) -> ReasonId {
        ReasonId::parse(&format!("{}/{}", self.dataset, self.suffix))
    }

    fn justification(&self) -> &Justification {
        &self.justification
    }

    fn justification_mut(&mut self) -> &mut Justification {
        &mut self.justification
    }

    fn confidence(&self) -> f64 {
        self.confidence
    }

    fn set_confidence(&mut self, confidence: f64) {
        self.confidence = confidence;
    }
}

impl Entity for ExternalReason {
    const KIND: EntityKind = EntityKind::ExternalReason;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_reason_is_supported_by_its_parent() {
        let dataset = Dataset::new("/data/test", Some("en"));
        let root = ExternalReason::root(&dataset);
        let child = root.derived("/reason1", 0.99).unwrap();

        assert_eq!(child.reason_id().to_string(), "/data/test/reason1");
        assert_eq!(child.confidence(), 0.99);
        assert_eq!(
            child.justification().get_support(),
            vec![vec![(dataset.root_reason(), 1.0)]]
        );
    }

    #[test]
    fn reliability_is_clamped() {
        let root = ExternalReason::root(&Dataset::new("t", None));
        assert_eq!(root.derived("x", 4.0).unwrap().confidence(), 1.0);
    }
}
