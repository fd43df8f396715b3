use serde::{Deserialize, Serialize};

use conceptdb_core::{EntityKind, ReasonId};

use super::natural_id;
use crate::justification::Justification;
use crate::justified::{Entity, Justified};

/// Raw text from a dataset, and the assertions read out of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    pub id: String,
    pub dataset: String,
    pub text: String,
    /// Whitespace-separated tokens. No language-specific normalization.
    pub words: Vec<String>,
    /// Assertion ids.
    #[serde(default)]
    pub derived_assertions: Vec<String>,
    #[serde(default)]
    pub justification: Justification,
    #[serde(default)]
    pub confidence: f64,
}

impl Sentence {
    pub fn make(dataset: &str, text: &str) -> Self {
        Self {
            id: natural_id(&[dataset, text]),
            dataset: dataset.to_string(),
            text: text.to_string(),
            words: text.split_whitespace().map(str::to_string).collect(),
            derived_assertions: Vec::new(),
            justification: Justification::empty(),
            confidence: 0.0,
        }
    }

    /// Record that `assertion_id` was read from this sentence. Returns false
    /// when it was already recorded.
    pub fn add_assertion(&mut self, assertion_id: &str) -> bool {
        if self.derived_assertions.iter().any(|a| a == assertion_id) {
            return false;
        }
        self.derived_assertions.push(assertion_id.to_string());
        true
    }
}

impl Justified for Sentence {
    fn reason_id(&self) -> ReasonId {
        ReasonId::sentence(self.id.clone())
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

impl Entity for Sentence {
    const KIND: EntityKind = EntityKind::Sentence;
}
