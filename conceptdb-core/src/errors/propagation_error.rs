/// Fatal propagation errors. Numerical trouble inside a run is reported as a
/// warning on the outcome instead.
#[derive(Debug, thiserror::Error)]
pub enum PropagationError {
    #[error("root node {root} is not in the graph")]
    UnknownRoot { root: String },

    #[error("graph has no nodes")]
    EmptyGraph,

    #[error("graph file line {line}: {reason}")]
    GraphFormat { line: usize, reason: String },

    #[error("node {node:?} contains a tab or line break and cannot be written to a graph file")]
    UnwritableNode { node: String },

    #[error("invalid propagation config: {reason}")]
    InvalidConfig { reason: String },
}
