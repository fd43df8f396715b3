//! Justification: evidence for and against one entity.

mod flat;

pub use flat::FlatDisjunction;

use serde::{Deserialize, Serialize};

use conceptdb_core::confidence::combine;
use conceptdb_core::errors::{ConceptDbError, ConceptDbResult, ConsistencyError};
use conceptdb_core::traits::IEntityLookup;
use conceptdb_core::{Confidence, EntityRef, Polarity, ReasonId};

use crate::factor::{Conjunction, Disjunction, Factor};

/// Two disjunctions of weighted conjunctions plus a cached score.
///
/// The score is only refreshed by [`Justification::update_confidence`];
/// mutations leave it stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "StoredJustification", try_from = "StoredJustification")]
pub struct Justification {
    support: Disjunction,
    oppose: Disjunction,
    confidence_score: f64,
}

impl Default for Justification {
    fn default() -> Self {
        Self::empty()
    }
}

impl Justification {
    /// No evidence either way, confidence 0.
    pub fn empty() -> Self {
        Self {
            support: Disjunction::new(),
            oppose: Disjunction::new(),
            confidence_score: 0.0,
        }
    }

    /// Build from nested `[[(id, weight), ...], ...]` trees.
    pub fn make<S, SC, SF, O, OC, OF>(support: S, oppose: O) -> ConceptDbResult<Self>
    where
        S: IntoIterator<Item = SC>,
        SC: IntoIterator<Item = SF>,
        SF: Into<Factor>,
        O: IntoIterator<Item = OC>,
        OC: IntoIterator<Item = OF>,
        OF: Into<Factor>,
    {
        let mut j = Self::empty();
        for conjunction in support {
            j.add_support(conjunction)?;
        }
        for conjunction in oppose {
            j.add_oppose(conjunction)?;
        }
        Ok(j)
    }

    /// Add a supporting conjunction, or overwrite the weights of an existing
    /// one with the same factor set.
    pub fn add_support<I, F>(&mut self, factors: I) -> ConceptDbResult<&mut Self>
    where
        I: IntoIterator<Item = F>,
        F: Into<Factor>,
    {
        self.add_conjunction(Polarity::Support, Conjunction::new(factors)?);
        Ok(self)
    }

    /// Add an opposing conjunction, or overwrite the weights of an existing
    /// one with the same factor set.
    pub fn add_oppose<I, F>(&mut self, factors: I) -> ConceptDbResult<&mut Self>
    where
        I: IntoIterator<Item = F>,
        F: Into<Factor>,
    {
        self.add_conjunction(Polarity::Oppose, Conjunction::new(factors)?);
        Ok(self)
    }

    /// Returns true when the conjunction was new.
    pub fn add_conjunction(&mut self, side: Polarity, conjunction: Conjunction) -> bool {
        self.side_mut(side).insert(conjunction)
    }

    pub fn support(&self) -> &Disjunction {
        &self.support
    }

    pub fn oppose(&self) -> &Disjunction {
        &self.oppose
    }

    pub fn side(&self, side: Polarity) -> &Disjunction {
        match side {
            Polarity::Support => &self.support,
            Polarity::Oppose => &self.oppose,
        }
    }

    fn side_mut(&mut self, side: Polarity) -> &mut Disjunction {
        match side {
            Polarity::Support => &mut self.support,
            Polarity::Oppose => &mut self.oppose,
        }
    }

    pub fn get_support(&self) -> Vec<Vec<(ReasonId, f64)>> {
        self.support.to_nested()
    }

    pub fn get_oppose(&self) -> Vec<Vec<(ReasonId, f64)>> {
        self.oppose.to_nested()
    }

    /// Supporting conjunctions with every factor dereferenced.
    /// Fails with `NotFound` on the first factor that does not resolve.
    pub fn get_support_resolved(
        &self,
        lookup: &dyn IEntityLookup,
    ) -> ConceptDbResult<Vec<Vec<(EntityRef, f64)>>> {
        resolve(&self.support, lookup)
    }

    pub fn get_oppose_resolved(
        &self,
        lookup: &dyn IEntityLookup,
    ) -> ConceptDbResult<Vec<Vec<(EntityRef, f64)>>> {
        resolve(&self.oppose, lookup)
    }

    /// The cached score.
    pub fn confidence(&self) -> f64 {
        self.confidence_score
    }

    pub fn is_empty(&self) -> bool {
        self.support.is_empty() && self.oppose.is_empty()
    }

    /// `1 - Π(1 - P(conj))` with `P(conj) = Π clamp(confidence) · clamp(weight)`.
    ///
    /// Factors are treated as independent. An unresolved factor counts as
    /// [`Confidence::NEUTRAL`] unless `strict`, in which case it is `NotFound`.
    pub fn compute_confidence(
        disjunction: &Disjunction,
        lookup: &dyn IEntityLookup,
        strict: bool,
    ) -> ConceptDbResult<f64> {
        let mut probabilities = Vec::with_capacity(disjunction.len());
        for conjunction in disjunction {
            let mut members = Vec::with_capacity(conjunction.len());
            for (id, weight) in conjunction.factors() {
                members.push((factor_confidence(lookup, id, strict)?, *weight));
            }
            probabilities.push(combine::conjunction_probability(members));
        }
        Ok(combine::disjunction_confidence(probabilities))
    }

    /// Recompute and cache `C(support) · (1 - C(oppose))`.
    pub fn update_confidence(
        &mut self,
        lookup: &dyn IEntityLookup,
        strict: bool,
    ) -> ConceptDbResult<f64> {
        let support = Self::compute_confidence(&self.support, lookup, strict)?;
        let oppose = Self::compute_confidence(&self.oppose, lookup, strict)?;
        self.confidence_score = combine::support_against_oppose(support, oppose);
        Ok(self.confidence_score)
    }

    /// Report the first violated invariant. Nothing is repaired.
    pub fn check_consistency(&self, lookup: &dyn IEntityLookup) -> ConceptDbResult<()> {
        if !(0.0..=1.0).contains(&self.confidence_score) {
            return Err(ConsistencyError::ConfidenceOutOfRange {
                value: self.confidence_score,
            }
            .into());
        }
        for side in [Polarity::Support, Polarity::Oppose] {
            let disjunction = self.side(side);
            if let Some(dup) = disjunction.duplicate_factor_set() {
                let factors: Vec<String> = dup.ids().map(ToString::to_string).collect();
                return Err(ConsistencyError::DuplicateFactorSet {
                    side: side.as_str().to_string(),
                    factors: factors.join(", "),
                }
                .into());
            }
            FlatDisjunction::from_disjunction(disjunction).validate(side.as_str())?;
            for conjunction in disjunction {
                for id in conjunction.ids() {
                    if lookup.lookup(id)?.is_none() {
                        return Err(ConsistencyError::UnresolvedFactor { id: id.to_string() }.into());
                    }
                }
            }
        }
        Ok(())
    }

    /// Whether `id` appears as its own factor on either side.
    pub fn self_referencing(&self, id: &ReasonId) -> bool {
        self.factor_ids().any(|f| f == id)
    }

    /// Every factor id, support side first, in stored order.
    pub fn factor_ids(&self) -> impl Iterator<Item = &ReasonId> {
        self.support
            .iter()
            .chain(self.oppose.iter())
            .flat_map(|c| c.ids())
    }

    pub fn flat_support(&self) -> FlatDisjunction {
        FlatDisjunction::from_disjunction(&self.support)
    }

    pub fn flat_oppose(&self) -> FlatDisjunction {
        FlatDisjunction::from_disjunction(&self.oppose)
    }
}

fn factor_confidence(lookup: &dyn IEntityLookup, id: &ReasonId, strict: bool) -> ConceptDbResult<f64> {
    match lookup.lookup(id)? {
        Some(entity) => Ok(entity.confidence.value()),
        None if strict => Err(ConceptDbError::not_found(id)),
        None => Ok(Confidence::NEUTRAL),
    }
}

fn resolve(
    disjunction: &Disjunction,
    lookup: &dyn IEntityLookup,
) -> ConceptDbResult<Vec<Vec<(EntityRef, f64)>>> {
    disjunction
        .iter()
        .map(|conjunction| {
            conjunction
                .factors()
                .iter()
                .map(|(id, weight)| {
                    lookup
                        .lookup(id)?
                        .map(|entity| (entity, *weight))
                        .ok_or_else(|| ConceptDbError::not_found(id))
                })
                .collect::<ConceptDbResult<Vec<_>>>()
        })
        .collect()
}

/// Serialized shape: both sides flattened.
#[derive(Serialize, Deserialize)]
struct StoredJustification {
    #[serde(default)]
    support: FlatDisjunction,
    #[serde(default)]
    oppose: FlatDisjunction,
    #[serde(default)]
    confidence_score: f64,
}

impl From<Justification> for StoredJustification {
    fn from(j: Justification) -> Self {
        Self {
            support: j.flat_support(),
            oppose: j.flat_oppose(),
            confidence_score: j.confidence_score,
        }
    }
}

impl TryFrom<StoredJustification> for Justification {
    type Error = ConsistencyError;

    fn try_from(stored: StoredJustification) -> Result<Self, Self::Error> {
        Ok(Self {
            support: stored.support.to_disjunction(Polarity::Support.as_str())?,
            oppose: stored.oppose.to_disjunction(Polarity::Oppose.as_str())?,
            confidence_score: stored.confidence_score,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn id(name: &str) -> ReasonId {
        ReasonId::named(name)
    }

    fn lookup(entries: &[(&str, f64)]) -> HashMap<ReasonId, f64> {
        entries.iter().map(|(n, c)| (id(n), *c)).collect()
    }

    #[test]
    fn empty_has_zero_confidence_and_is_consistent() {
        let j = Justification::empty();
        assert_eq!(j.confidence(), 0.0);
        assert!(j.check_consistency(&lookup(&[])).is_ok());
    }

    #[test]
    fn support_only_equals_support_confidence() {
        let mut j = Justification::empty();
        j.add_support([("a", 1.0)]).unwrap();
        let score = j.update_confidence(&lookup(&[("a", 0.8)]), false).unwrap();
        assert!((score - 0.8).abs() < 1e-12);
    }

    #[test]
    fn missing_factor_is_neutral_unless_strict() {
        let mut j = Justification::empty();
        j.add_support([("ghost", 1.0)]).unwrap();
        let score = j.update_confidence(&lookup(&[]), false).unwrap();
        assert!((score - 0.5).abs() < 1e-12);

        let err = j.update_confidence(&lookup(&[]), true).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn resolved_getter_reports_missing_factor() {
        let mut j = Justification::empty();
        j.add_oppose([("a", 1.0), ("b", 0.5)]).unwrap();
        let table = lookup(&[("a", 0.3)]);
        assert!(j.get_oppose_resolved(&table).unwrap_err().is_not_found());

        let table = lookup(&[("a", 0.3), ("b", 0.9)]);
        let resolved = j.get_oppose_resolved(&table).unwrap();
        assert_eq!(resolved[0][1].0.confidence.value(), 0.9);
        assert_eq!(resolved[0][1].1, 0.5);
    }

    #[test]
    fn add_returns_self_for_chaining() {
        let mut j = Justification::empty();
        j.add_support([("a", 1.0)])
            .unwrap()
            .add_oppose([("b", 1.0)])
            .unwrap();
        assert_eq!(j.support().len(), 1);
        assert_eq!(j.oppose().len(), 1);
    }

    #[test]
    fn self_reference_is_allowed_but_detectable() {
        let mut j = Justification::empty();
        j.add_support([("me", 1.0), ("other", 1.0)]).unwrap();
        assert!(j.self_referencing(&id("me")));
        assert!(!j.self_referencing(&id("nobody")));
    }

    #[test]
    fn unresolved_factor_fails_consistency() {
        let mut j = Justification::empty();
        j.add_support([("a", 1.0)]).unwrap();
        let err = j.check_consistency(&lookup(&[])).unwrap_err();
        assert!(matches!(
            err,
            ConceptDbError::Consistency(ConsistencyError::UnresolvedFactor { .. })
        ));
    }

    #[test]
    fn stored_duplicates_fail_consistency() {
        let json = r#"{
            "support": {"flat": ["a", "a"], "offsets": [0, 1], "weights": [1.0, 0.5]},
            "oppose": {"flat": [], "offsets": [], "weights": []},
            "confidence_score": 0.0
        }"#;
        let j: Justification = serde_json::from_str(json).unwrap();
        let err = j.check_consistency(&lookup(&[("a", 1.0)])).unwrap_err();
        assert!(matches!(
            err,
            ConceptDbError::Consistency(ConsistencyError::DuplicateFactorSet { .. })
        ));
    }

    #[test]
    fn out_of_range_score_fails_consistency() {
        let json = r#"{"confidence_score": 1.5}"#;
        let j: Justification = serde_json::from_str(json).unwrap();
        let err = j.check_consistency(&lookup(&[])).unwrap_err();
        assert!(matches!(
            err,
            ConceptDbError::Consistency(ConsistencyError::ConfidenceOutOfRange { .. })
        ));
    }

    #[test]
    fn malformed_offsets_fail_to_deserialize() {
        let json = r#"{"support": {"flat": ["a"], "offsets": [1], "weights": [1.0]}}"#;
        assert!(serde_json::from_str::<Justification>(json).is_err());
    }

    #[test]
    fn serializes_to_flat_form() {
        let mut j = Justification::empty();
        j.add_support([("a", 0.5), ("b", 0.5)]).unwrap();
        j.add_support([("c", 1.0)]).unwrap();
        let value = serde_json::to_value(&j).unwrap();
        assert_eq!(value["support"]["offsets"], serde_json::json!([0, 2]));
        assert_eq!(value["support"]["flat"], serde_json::json!(["a", "b", "c"]));
        let back: Justification = serde_json::from_value(value).unwrap();
        assert_eq!(back, j);
    }
}
