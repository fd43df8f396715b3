use crate::confidence::Confidence;
use crate::errors::ConceptDbResult;
use crate::reason_id::ReasonId;

/// id -> scalar confidence.
pub trait IConfidenceStorage: Send + Sync {
    /// Stored confidence, or [`Confidence::NEUTRAL`] when nothing is stored.
    fn get(&self, id: &ReasonId) -> ConceptDbResult<Confidence> {
        Ok(self
            .get_stored(id)?
            .unwrap_or_else(|| Confidence::new(Confidence::NEUTRAL)))
    }

    /// Stored confidence, `None` when absent.
    fn get_stored(&self, id: &ReasonId) -> ConceptDbResult<Option<Confidence>>;

    /// Last write wins.
    fn set(&self, id: &ReasonId, confidence: Confidence) -> ConceptDbResult<()>;

    /// Write many values in one transaction. Returns the number written.
    fn set_many(&self, values: &[(ReasonId, Confidence)]) -> ConceptDbResult<usize>;
}
