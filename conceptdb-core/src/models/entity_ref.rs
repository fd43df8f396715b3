use serde::{Deserialize, Serialize};

use crate::confidence::Confidence;
use crate::reason_id::ReasonId;

/// The kind of entity a [`ReasonId`] names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Assertion,
    Expression,
    Sentence,
    ExternalReason,
    ReasonConjunction,
    Named,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        Self::Assertion,
        Self::Expression,
        Self::Sentence,
        Self::ExternalReason,
        Self::ReasonConjunction,
        Self::Named,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assertion => "assertion",
            Self::Expression => "expression",
            Self::Sentence => "sentence",
            Self::ExternalReason => "external_reason",
            Self::ReasonConjunction => "reason_conjunction",
            Self::Named => "named",
        }
    }

    pub fn from_str_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

/// What a lookup returns: enough of an entity to weigh it as a factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: ReasonId,
    pub kind: EntityKind,
    pub confidence: Confidence,
}

impl EntityRef {
    pub fn new(id: ReasonId, confidence: impl Into<Confidence>) -> Self {
        let kind = id.kind();
        Self {
            id,
            kind,
            confidence: confidence.into(),
        }
    }
}
