use crate::errors::ConceptDbResult;
use crate::models::ReasonRecord;
use crate::reason_id::ReasonId;

/// Persisted reasons, keyed by (target, factor set).
pub trait IReasonStorage: Send + Sync {
    /// Create or update the record for `(target, factors)`. Atomic: concurrent
    /// callers with the same key end with exactly one record carrying the
    /// last written vote and weight.
    fn make(
        &self,
        target: &ReasonId,
        factors: &[ReasonId],
        vote: f64,
        weight: f64,
    ) -> ConceptDbResult<ReasonRecord>;

    fn by_target(&self, target: &ReasonId) -> ConceptDbResult<Vec<ReasonRecord>>;
    fn by_factor(&self, factor: &ReasonId) -> ConceptDbResult<Vec<ReasonRecord>>;

    /// Every record, ordered by target then factor key.
    fn all(&self) -> ConceptDbResult<Vec<ReasonRecord>>;
    fn count(&self) -> ConceptDbResult<usize>;
}
