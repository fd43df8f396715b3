use std::fmt;

use serde::{Deserialize, Serialize};

use conceptdb_core::constants::BLANK;
use conceptdb_core::errors::{ConceptDbError, ConceptDbResult, ConsistencyError};
use conceptdb_core::{EntityKind, ReasonId};

use super::{blank_out, natural_id};
use crate::factor::Factor;
use crate::justification::Justification;
use crate::justified::{Entity, Justified};

/// A relational fact: `relation(arguments...)` in a dataset and context.
///
/// Identity is the natural key (dataset, relation, polarity, argstr,
/// context), so making the same assertion twice yields the same id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assertion {
    pub id: String,
    pub dataset: String,
    pub relation: String,
    pub arguments: Vec<String>,
    pub argstr: String,
    /// False when any argument is the blank placeholder.
    pub complete: bool,
    pub context: Option<String>,
    /// 1, 0 or -1.
    pub polarity: i8,
    #[serde(default)]
    pub justification: Justification,
    #[serde(default)]
    pub confidence: f64,
}

impl Assertion {
    pub fn make(
        dataset: &str,
        relation: &str,
        arguments: Vec<String>,
        polarity: i8,
        context: Option<&str>,
    ) -> ConceptDbResult<Self> {
        if !matches!(polarity, -1..=1) {
            return Err(ConceptDbError::InvalidArgument(format!(
                "assertion polarity must be 1, 0 or -1, got {polarity}"
            )));
        }
        let argstr = Self::make_arg_string(&arguments);
        Ok(Self {
            id: Self::natural_key_id(dataset, relation, polarity, &argstr, context),
            dataset: dataset.to_string(),
            relation: relation.to_string(),
            complete: !arguments.iter().any(|a| a == BLANK),
            arguments,
            argstr,
            context: context.map(str::to_string),
            polarity,
            justification: Justification::empty(),
            confidence: 0.0,
        })
    }

    /// Comma-joined arguments, with commas inside an argument replaced by `_`.
    pub fn make_arg_string<S: AsRef<str>>(arguments: &[S]) -> String {
        arguments
            .iter()
            .map(|a| a.as_ref().replace(',', "_"))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn natural_key_id(
        dataset: &str,
        relation: &str,
        polarity: i8,
        argstr: &str,
        context: Option<&str>,
    ) -> String {
        let polarity = polarity.to_string();
        let context = context.map_or_else(|| "\u{0}".to_string(), |c| format!("={c}"));
        natural_id(&[dataset, relation, &polarity, argstr, &context])
    }

    /// Every way of blanking out at least one filled argument. The first
    /// argument varies fastest.
    pub fn generalization_patterns(&self) -> Vec<Vec<bool>> {
        let mut patterns: Vec<Vec<bool>> = vec![Vec::new()];
        for arg in self.arguments.iter().rev() {
            let choices: &[bool] = if arg == BLANK { &[false] } else { &[true, false] };
            patterns = patterns
                .into_iter()
                .flat_map(|tail| {
                    choices.iter().map(move |&c| {
                        let mut p = Vec::with_capacity(tail.len() + 1);
                        p.push(c);
                        p.extend_from_slice(&tail);
                        p
                    })
                })
                .collect();
        }
        patterns.retain(|p| p.contains(&true));
        patterns
    }

    /// The assertion with the arguments selected by `pattern` blanked out,
    /// supported jointly by `reason` and this assertion.
    pub fn generalize(&self, pattern: &[bool], reason: &ReasonId) -> ConceptDbResult<Self> {
        let arguments = blank_out(&self.arguments, pattern)?;
        let mut general = Self::make(
            &self.dataset,
            &self.relation,
            arguments,
            self.polarity,
            self.context.as_deref(),
        )?;
        general.add_support(vec![Factor::new(reason.clone(), 1.0), Factor::of(self, 1.0)])?;
        Ok(general)
    }
}

impl Justified for Assertion {
    fn reason_id(&self) -> ReasonId {
        ReasonId::assertion(self.id.clone())
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
        let fail = |details: &str| -> ConceptDbResult<()> {
            Err(ConsistencyError::Entity {
                entity: self.reason_id().to_string(),
                details: details.to_string(),
            }
            .into())
        };
        if !matches!(self.polarity, -1..=1) {
            return fail("polarity must be 1, 0 or -1");
        }
        if self.argstr != Self::make_arg_string(&self.arguments) {
            return fail("argstr does not match arguments");
        }
        if self.complete == self.arguments.iter().any(|a| a == BLANK) {
            return fail("complete flag does not match arguments");
        }
        Ok(())
    }
}

impl Entity for Assertion {
    const KIND: EntityKind = EntityKind::Assertion;
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = match self.polarity {
            1 => '+',
            -1 => '-',
            _ => '?',
        };
        let last = |s: &str| s.rsplit('/').next().unwrap_or(s).to_string();
        let args: Vec<String> = self.argstr.split(',').map(last).collect();
        write!(
            f,
            "{sign}{}({}) in {}:{}",
            last(&self.relation),
            args.join(", "),
            self.dataset,
            self.context.as_deref().unwrap_or(BLANK)
        )
    }
}
