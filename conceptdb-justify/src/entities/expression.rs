use serde::{Deserialize, Serialize};

use conceptdb_core::constants::BLANK;
use conceptdb_core::errors::{ConceptDbResult, ConsistencyError};
use conceptdb_core::{EntityKind, ReasonId};

use super::assertion::Assertion;
use super::{blank_out, natural_id};
use crate::factor::Factor;
use crate::justification::Justification;
use crate::justified::{Entity, Justified};

/// A natural-language rendering of an assertion: a frame such as
/// `"{0} is a {1}"` filled with the assertion's arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub id: String,
    /// Id of the assertion this expresses.
    pub assertion: String,
    pub frame: String,
    pub arguments: Vec<String>,
    pub language: String,
    pub text: String,
    #[serde(default)]
    pub justification: Justification,
    #[serde(default)]
    pub confidence: f64,
}

impl Expression {
    pub fn make(assertion: &Assertion, frame: &str, arguments: Vec<String>, language: &str) -> Self {
        let text = Self::replace_args(frame, &arguments);
        Self {
            id: natural_id(&[&assertion.id, language, frame, &text]),
            assertion: assertion.id.clone(),
            frame: frame.to_string(),
            arguments,
            language: language.to_string(),
            text,
            justification: Justification::empty(),
            confidence: 0.0,
        }
    }

    /// Fill `{i}` slots with argument `i`. Blank arguments keep their slot,
    /// and slots with no matching argument are left as written.
    pub fn replace_args<S: AsRef<str>>(frame: &str, arguments: &[S]) -> String {
        let mut out = String::with_capacity(frame.len());
        let mut rest = frame;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let slot = after
                .find('}')
                .and_then(|close| after[..close].parse::<usize>().ok().map(|i| (i, close)));
            match slot {
                Some((index, close)) => {
                    let arg: Option<&str> = arguments.get(index).map(|a| a.as_ref());
                    match arg {
                        Some(arg) if arg != BLANK => out.push_str(arg),
                        _ => out.push_str(&rest[open..open + close + 2]),
                    }
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }

    pub fn assertion_id(&self) -> ReasonId {
        ReasonId::assertion(self.assertion.clone())
    }

    /// Consistency against the owning assertion: same number of arguments.
    pub fn check_against(&self, assertion: &Assertion) -> ConceptDbResult<()> {
        if assertion.id != self.assertion || assertion.arguments.len() != self.arguments.len() {
            return Err(ConsistencyError::Entity {
                entity: self.reason_id().to_string(),
                details: format!(
                    "expression has {} arguments, assertion {} has {}",
                    self.arguments.len(),
                    assertion.id,
                    assertion.arguments.len()
                ),
            }
            .into());
        }
        Ok(())
    }

    /// This expression re-rendered for a generalized assertion.
    pub fn generalize(
        &self,
        pattern: &[bool],
        assertion: &Assertion,
        reason: &ReasonId,
    ) -> ConceptDbResult<Self> {
        let arguments = blank_out(&self.arguments, pattern)?;
        let mut general = Self::make(assertion, &self.frame, arguments, &self.language);
        general.add_support(vec![Factor::new(reason.clone(), 1.0), Factor::of(self, 1.0)])?;
        Ok(general)
    }
}

impl Justified for Expression {
    fn reason_id(&self) -> ReasonId {
        ReasonId::expression(self.assertion.clone(), self.id.clone())
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

    fn check_entity(&self) -> ConceptDbResult<()> {
        if Self::replace_args(&self.frame, &self.arguments) != self.text {
            return Err(ConsistencyError::Entity {
                entity: self.reason_id().to_string(),
                details: "text does not match the rendered frame".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl Entity for Expression {
    const KIND: EntityKind = EntityKind::Expression;
}
