//! The stored form of a disjunction: one flat list of factors, the start
//! offset of each conjunction, and one weight per factor.
//!
//! Conjunctions of sizes 3, 4 and 2 flatten to offsets `[0, 3, 7]`.

use serde::{Deserialize, Serialize};

use conceptdb_core::errors::ConsistencyError;
use conceptdb_core::ReasonId;

use crate::factor::{Conjunction, Disjunction};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlatDisjunction {
    pub flat: Vec<ReasonId>,
    pub offsets: Vec<usize>,
    pub weights: Vec<f64>,
}

impl FlatDisjunction {
    pub fn from_disjunction(disjunction: &Disjunction) -> Self {
        let mut out = Self::default();
        for conjunction in disjunction {
            out.offsets.push(out.flat.len());
            for (id, weight) in conjunction.factors() {
                out.flat.push(id.clone());
                out.weights.push(*weight);
            }
        }
        out
    }

    /// Check that the three lists describe a disjunction.
    pub fn validate(&self, side: &str) -> Result<(), ConsistencyError> {
        if self.flat.len() != self.weights.len() {
            return Err(ConsistencyError::WeightLengthMismatch {
                side: side.to_string(),
                factors: self.flat.len(),
                weights: self.weights.len(),
            });
        }
        if let Some(&offset) = self.offsets.iter().find(|&&o| o >= self.flat.len()) {
            return Err(ConsistencyError::OffsetOutOfBounds {
                side: side.to_string(),
                offset,
                len: self.flat.len(),
            });
        }
        let starts_at_zero = self.offsets.first().map_or(self.flat.is_empty(), |&o| o == 0);
        let increasing = self.offsets.windows(2).all(|w| w[0] < w[1]);
        if !starts_at_zero || !increasing {
            return Err(ConsistencyError::OffsetsNotIncreasing {
                side: side.to_string(),
                offsets: self.offsets.clone(),
            });
        }
        Ok(())
    }

    /// Rebuild the disjunction exactly as stored, duplicates included.
    pub fn to_disjunction(&self, side: &str) -> Result<Disjunction, ConsistencyError> {
        self.validate(side)?;
        let mut disjunction = Disjunction::new();
        let ends = self.offsets.iter().skip(1).copied().chain([self.flat.len()]);
        for (start, end) in self.offsets.iter().copied().zip(ends) {
            let members = self.flat[start..end]
                .iter()
                .cloned()
                .zip(self.weights[start..end].iter().copied());
            // Strictly increasing offsets make every slice non-empty.
            let conjunction =
                Conjunction::new(members).map_err(|e| ConsistencyError::Entity {
                    entity: format!("{side} disjunction"),
                    details: e.to_string(),
                })?;
            disjunction.push_raw(conjunction);
        }
        Ok(disjunction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(n: usize, offsets: Vec<usize>) -> FlatDisjunction {
        FlatDisjunction {
            flat: (0..n).map(|i| ReasonId::named(format!("r{i}"))).collect(),
            offsets,
            weights: vec![0.5; n],
        }
    }

    #[test]
    fn start_offsets_split_conjunctions() {
        let d = flat(9, vec![0, 3, 7]).to_disjunction("support").unwrap();
        let sizes: Vec<usize> = d.iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![3, 4, 2]);
    }

    #[test]
    fn empty_is_valid() {
        let d = FlatDisjunction::default().to_disjunction("oppose").unwrap();
        assert!(d.is_empty());
    }

    #[test]
    fn offset_past_end_is_rejected() {
        let err = flat(3, vec![0, 3]).validate("support").unwrap_err();
        assert!(matches!(err, ConsistencyError::OffsetOutOfBounds { offset: 3, .. }));
    }

    #[test]
    fn first_offset_must_be_zero() {
        let err = flat(3, vec![1]).validate("support").unwrap_err();
        assert!(matches!(err, ConsistencyError::OffsetsNotIncreasing { .. }));
    }

    #[test]
    fn repeated_offset_is_rejected() {
        let err = flat(3, vec![0, 2, 2]).validate("support").unwrap_err();
        assert!(matches!(err, ConsistencyError::OffsetsNotIncreasing { .. }));
    }

    #[test]
    fn factors_without_offsets_are_rejected() {
        let err = flat(2, vec![]).validate("support").unwrap_err();
        assert!(matches!(err, ConsistencyError::OffsetsNotIncreasing { .. }));
    }

    #[test]
    fn weight_count_must_match() {
        let mut f = flat(3, vec![0]);
        f.weights.pop();
        let err = f.validate("oppose").unwrap_err();
        assert!(matches!(
            err,
            ConsistencyError::WeightLengthMismatch { factors: 3, weights: 2, .. }
        ));
    }

    #[test]
    fn non_finite_stored_weight_surfaces_as_consistency_error() {
        let mut f = flat(2, vec![0]);
        f.weights[1] = f64::NAN;
        assert!(f.to_disjunction("support").is_err());
    }
}
