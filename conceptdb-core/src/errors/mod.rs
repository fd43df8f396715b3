mod conceptdb_error;
mod consistency_error;
mod propagation_error;
mod storage_error;

pub use conceptdb_error::{ConceptDbError, ConceptDbResult};
pub use consistency_error::ConsistencyError;
pub use propagation_error::PropagationError;
pub use storage_error::StorageError;
