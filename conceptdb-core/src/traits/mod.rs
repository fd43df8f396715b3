mod audit;
mod confidence;
mod entity;
mod reason;

pub use audit::IAuditLog;
pub use confidence::IConfidenceStorage;
pub use entity::{IEntityLookup, IEntityStorage};
pub use reason::IReasonStorage;
