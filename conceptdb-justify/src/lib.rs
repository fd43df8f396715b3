//! # conceptdb-justify
//!
//! Evidence bookkeeping for ConceptDB. A [`Justification`] holds a
//! disjunction of supporting conjunctions and a disjunction of opposing ones,
//! and folds them into a confidence score. Entities that own a justification
//! implement [`Justified`]; [`JustificationEngine`] persists them and their
//! reason records through the storage traits in `conceptdb-core`.

pub mod engine;
pub mod entities;
pub mod factor;
pub mod justification;
pub mod justified;
pub mod locks;

pub use engine::JustificationEngine;
pub use entities::{Assertion, Dataset, Expression, ExternalReason, Sentence};
pub use factor::{Conjunction, Disjunction, Factor};
pub use justification::{FlatDisjunction, Justification};
pub use justified::{Entity, Justified};
pub use locks::EntityLocks;
