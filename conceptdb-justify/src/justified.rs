//! Entities that own a justification.

use serde::de::DeserializeOwned;
use serde::Serialize;

use conceptdb_core::errors::ConceptDbResult;
use conceptdb_core::traits::IEntityLookup;
use conceptdb_core::{EntityKind, ReasonId};

use crate::factor::Factor;
use crate::justification::Justification;

/// Anything that owns exactly one [`Justification`].
pub trait Justified {
    /// The id other justifications use to cite this entity.
    fn reason_id(&self) -> ReasonId;

    fn justification(&self) -> &Justification;
    fn justification_mut(&mut self) -> &mut Justification;

    /// Last confidence assigned to the entity, by whichever estimator ran.
    fn confidence(&self) -> f64;
    fn set_confidence(&mut self, confidence: f64);

    /// Entity-specific invariants beyond those of the justification.
    fn check_entity(&self) -> ConceptDbResult<()> {
        Ok(())
    }

    fn add_support(&mut self, factors: Vec<Factor>) -> ConceptDbResult<()> {
        self.justification_mut().add_support(factors)?;
        Ok(())
    }

    fn add_oppose(&mut self, factors: Vec<Factor>) -> ConceptDbResult<()> {
        self.justification_mut().add_oppose(factors)?;
        Ok(())
    }

    /// Recompute the local score and adopt it as this entity's confidence.
    fn update_confidence(
        &mut self,
        lookup: &dyn IEntityLookup,
        strict: bool,
    ) -> ConceptDbResult<f64> {
        let score = self.justification_mut().update_confidence(lookup, strict)?;
        self.set_confidence(score);
        Ok(score)
    }

    fn check_consistency(&self, lookup: &dyn IEntityLookup) -> ConceptDbResult<()> {
        self.check_entity()?;
        self.justification().check_consistency(lookup)
    }
}

/// A justified entity that can be persisted as a JSON body.
pub trait Entity: Justified + Serialize + DeserializeOwned + Send {
    const KIND: EntityKind;
}
