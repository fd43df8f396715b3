//! Conjunctions and disjunctions of weighted reasons.

use std::collections::BTreeSet;

use conceptdb_core::errors::{ConceptDbError, ConceptDbResult};
use conceptdb_core::ReasonId;

use crate::justified::Justified;

/// One weighted member of a conjunction.
#[derive(Debug, Clone, PartialEq)]
pub struct Factor {
    pub id: ReasonId,
    pub weight: f64,
}

impl Factor {
    pub fn new(id: impl Into<ReasonId>, weight: f64) -> Self {
        Self {
            id: id.into(),
            weight,
        }
    }

    /// A factor naming an entity that owns a justification.
    pub fn of<J: Justified + ?Sized>(entity: &J, weight: f64) -> Self {
        Self {
            id: entity.reason_id(),
            weight,
        }
    }
}

impl From<(ReasonId, f64)> for Factor {
    fn from((id, weight): (ReasonId, f64)) -> Self {
        Self { id, weight }
    }
}

impl From<(&ReasonId, f64)> for Factor {
    fn from((id, weight): (&ReasonId, f64)) -> Self {
        Self {
            id: id.clone(),
            weight,
        }
    }
}

impl From<(&str, f64)> for Factor {
    fn from((id, weight): (&str, f64)) -> Self {
        Self::new(id, weight)
    }
}

impl<'a> From<(&'a dyn Justified, f64)> for Factor {
    fn from((entity, weight): (&'a dyn Justified, f64)) -> Self {
        Self::of(entity, weight)
    }
}

/// Logical AND of weighted reasons. Order is kept as inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct Conjunction {
    factors: Vec<(ReasonId, f64)>,
}

impl Conjunction {
    /// Build a conjunction, rejecting empty input and non-finite weights.
    pub fn new<I, F>(factors: I) -> ConceptDbResult<Self>
    where
        I: IntoIterator<Item = F>,
        F: Into<Factor>,
    {
        let factors: Vec<(ReasonId, f64)> = factors
            .into_iter()
            .map(|f| {
                let f = f.into();
                (f.id, f.weight)
            })
            .collect();
        if factors.is_empty() {
            return Err(ConceptDbError::InvalidArgument(
                "a conjunction needs at least one factor".to_string(),
            ));
        }
        if let Some((id, w)) = factors.iter().find(|(_, w)| !w.is_finite()) {
            return Err(ConceptDbError::InvalidArgument(format!(
                "weight {w} for factor {id} is not finite"
            )));
        }
        Ok(Self { factors })
    }

    pub fn factors(&self) -> &[(ReasonId, f64)] {
        &self.factors
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ReasonId> {
        self.factors.iter().map(|(id, _)| id)
    }

    /// The identity of a conjunction: its set of factor ids.
    pub fn factor_set(&self) -> BTreeSet<&ReasonId> {
        self.ids().collect()
    }

    pub fn same_factors(&self, other: &Conjunction) -> bool {
        self.factor_set() == other.factor_set()
    }

    pub fn contains(&self, id: &ReasonId) -> bool {
        self.ids().any(|f| f == id)
    }

    /// Take each factor's weight from `other`, keeping this order.
    fn overwrite_weights(&mut self, other: &Conjunction) {
        for (id, weight) in &mut self.factors {
            if let Some((_, w)) = other.factors.iter().rev().find(|(o, _)| o == id) {
                *weight = *w;
            }
        }
    }
}

/// Logical OR of conjunctions, unique by factor set, in insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Disjunction {
    conjunctions: Vec<Conjunction>,
}

impl Disjunction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `conjunction`, or overwrite the weights of the existing one with
    /// the same factor set. Returns true when it was appended.
    pub fn insert(&mut self, conjunction: Conjunction) -> bool {
        match self
            .conjunctions
            .iter_mut()
            .find(|c| c.same_factors(&conjunction))
        {
            Some(existing) => {
                existing.overwrite_weights(&conjunction);
                false
            }
            None => {
                self.conjunctions.push(conjunction);
                true
            }
        }
    }

    /// Append without the uniqueness check. Used when restoring the stored
    /// form, so that `check_consistency` can see what was actually stored.
    pub(crate) fn push_raw(&mut self, conjunction: Conjunction) {
        self.conjunctions.push(conjunction);
    }

    pub fn conjunctions(&self) -> &[Conjunction] {
        &self.conjunctions
    }

    pub fn len(&self) -> usize {
        self.conjunctions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conjunctions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Conjunction> {
        self.conjunctions.iter()
    }

    /// Nested raw form.
    pub fn to_nested(&self) -> Vec<Vec<(ReasonId, f64)>> {
        self.conjunctions
            .iter()
            .map(|c| c.factors().to_vec())
            .collect()
    }

    /// First factor set that appears twice, if any.
    pub fn duplicate_factor_set(&self) -> Option<&Conjunction> {
        self.conjunctions.iter().enumerate().find_map(|(i, c)| {
            self.conjunctions[..i]
                .iter()
                .any(|earlier| earlier.same_factors(c))
                .then_some(c)
        })
    }
}

impl<'a> IntoIterator for &'a Disjunction {
    type Item = &'a Conjunction;
    type IntoIter = std::slice::Iter<'a, Conjunction>;

    fn into_iter(self) -> Self::IntoIter {
        self.conjunctions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conj(items: &[(&str, f64)]) -> Conjunction {
        Conjunction::new(items.iter().copied()).unwrap()
    }

    #[test]
    fn empty_conjunction_is_rejected() {
        let err = Conjunction::new(Vec::<Factor>::new()).unwrap_err();
        assert!(matches!(err, ConceptDbError::InvalidArgument(_)));
    }

    #[test]
    fn nan_weight_is_rejected() {
        assert!(Conjunction::new([("a", f64::NAN)]).is_err());
        assert!(Conjunction::new([("a", f64::INFINITY)]).is_err());
    }

    #[test]
    fn weights_outside_unit_interval_are_kept() {
        let c = conj(&[("a", 2.5), ("b", -1.0)]);
        assert_eq!(c.factors()[0].1, 2.5);
        assert_eq!(c.factors()[1].1, -1.0);
    }

    #[test]
    fn same_factor_set_ignores_order() {
        assert!(conj(&[("a", 1.0), ("b", 1.0)]).same_factors(&conj(&[("b", 0.2), ("a", 0.3)])));
        assert!(!conj(&[("a", 1.0)]).same_factors(&conj(&[("a", 1.0), ("b", 1.0)])));
    }

    #[test]
    fn reinsert_overwrites_weights_in_place() {
        let mut d = Disjunction::new();
        assert!(d.insert(conj(&[("a", 0.5), ("b", 0.5)])));
        assert!(d.insert(conj(&[("c", 0.5)])));
        assert!(!d.insert(conj(&[("b", 0.6), ("a", 0.5)])));

        assert_eq!(d.len(), 2);
        assert_eq!(
            d.to_nested()[0],
            vec![(ReasonId::named("a"), 0.5), (ReasonId::named("b"), 0.6)]
        );
    }

    #[test]
    fn duplicate_detection_only_sees_raw_pushes() {
        let mut d = Disjunction::new();
        d.insert(conj(&[("a", 1.0)]));
        d.insert(conj(&[("a", 0.5)]));
        assert!(d.duplicate_factor_set().is_none());

        d.push_raw(conj(&[("a", 0.1)]));
        assert!(d.duplicate_factor_set().is_some());
    }
}
