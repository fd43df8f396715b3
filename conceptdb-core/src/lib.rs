//! # conceptdb-core
//!
//! Foundation crate for the ConceptDB justification engine.
//! Defines reason identifiers, confidence arithmetic, records, traits, errors,
//! config, and constants. Every other crate in the workspace depends on this.

pub mod confidence;
pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod reason_id;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use confidence::Confidence;
pub use config::ConceptDbConfig;
pub use errors::{ConceptDbError, ConceptDbResult};
pub use models::{EntityKind, EntityRef, Polarity, ReasonRecord};
pub use reason_id::ReasonId;
