/// Failures reported by `check_consistency`. Never repaired silently.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConsistencyError {
    #[error("confidence {value} is outside [0, 1]")]
    ConfidenceOutOfRange { value: f64 },

    #[error("duplicate factor set in {side} disjunction: {factors}")]
    DuplicateFactorSet { side: String, factors: String },

    #[error("{side} offset {offset} is out of bounds for {len} factors")]
    OffsetOutOfBounds {
        side: String,
        offset: usize,
        len: usize,
    },

    #[error("{side} offsets are not strictly increasing from 0: {offsets:?}")]
    OffsetsNotIncreasing { side: String, offsets: Vec<usize> },

    #[error("{side} has {factors} factors but {weights} weights")]
    WeightLengthMismatch {
        side: String,
        factors: usize,
        weights: usize,
    },

    #[error("factor {id} does not resolve to any entity")]
    UnresolvedFactor { id: String },

    #[error("{entity}: {details}")]
    Entity { entity: String, details: String },
}
