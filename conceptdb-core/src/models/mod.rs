mod audit;
mod entity_ref;
mod reason_record;

pub use audit::{AuditAction, AuditEntry};
pub use entity_ref::{EntityKind, EntityRef};
pub use reason_record::{Polarity, ReasonRecord};
