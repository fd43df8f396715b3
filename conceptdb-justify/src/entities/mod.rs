//! The justified entities of ConceptDB.

mod assertion;
mod dataset;
mod expression;
mod external;
mod sentence;

pub use assertion::Assertion;
pub use dataset::Dataset;
pub use expression::Expression;
pub use external::ExternalReason;
pub use sentence::Sentence;

/// Replace the arguments selected by `pattern` with the blank placeholder.
pub(crate) fn blank_out(
    arguments: &[String],
    pattern: &[bool],
) -> conceptdb_core::ConceptDbResult<Vec<String>> {
    if arguments.len() != pattern.len() {
        return Err(conceptdb_core::ConceptDbError::InvalidArgument(format!(
            "pattern has {} slots for {} arguments",
            pattern.len(),
            arguments.len()
        )));
    }
    Ok(arguments
        .iter()
        .zip(pattern)
        .map(|(arg, &drop)| {
            if drop {
                conceptdb_core::constants::BLANK.to_string()
            } else {
                arg.clone()
            }
        })
        .collect())
}

/// Deterministic entity id from its natural key.
pub(crate) fn natural_id(parts: &[&str]) -> String {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update(&[0x1f]);
    }
    hasher.finalize().to_hex()[..24].to_string()
}
