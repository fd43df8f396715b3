use std::collections::HashMap;

use crate::confidence::Confidence;
use crate::errors::ConceptDbResult;
use crate::models::{EntityKind, EntityRef};
use crate::reason_id::ReasonId;

/// Resolves a reason id to the entity it names.
///
/// An id that names nothing is `Ok(None)`; errors are reserved for the
/// lookup itself failing.
pub trait IEntityLookup: Send + Sync {
    fn lookup(&self, id: &ReasonId) -> ConceptDbResult<Option<EntityRef>>;
}

/// Persists entity bodies as JSON.
pub trait IEntityStorage: Send + Sync {
    fn save_entity(&self, id: &ReasonId, body: &serde_json::Value) -> ConceptDbResult<()>;
    fn load_entity(&self, id: &ReasonId) -> ConceptDbResult<Option<serde_json::Value>>;
    fn entity_ids(&self, kind: EntityKind) -> ConceptDbResult<Vec<ReasonId>>;
}

/// A fixed table of confidences. Handy for tests and offline evaluation.
impl IEntityLookup for HashMap<ReasonId, f64> {
    fn lookup(&self, id: &ReasonId) -> ConceptDbResult<Option<EntityRef>> {
        Ok(self
            .get(id)
            .map(|&c| EntityRef::new(id.clone(), Confidence::new(c))))
    }
}
