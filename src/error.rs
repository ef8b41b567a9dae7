use thiserror::Error;

/// Errors surfaced by the row tree, the reconciliation pass and controller edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("field reported with an empty name under {parent:?}")]
    EmptyName { parent: String },

    #[error("close() without a matching open composite")]
    UnbalancedClose,

    #[error("{open} composite(s) still open at the end of the traversal")]
    UnclosedComposite { open: usize },

    #[error("row handle is stale (the row was dropped)")]
    StaleRow,

    #[error("row {0:?} is read-only")]
    ReadOnly(String),

    #[error("row {name:?} is not a {expected} row")]
    WrongKind {
        name: String,
        expected: &'static str,
    },

    #[error("no exemplar available for {0:?}")]
    NoExemplar(String),

    #[error("index {index} out of range for {name:?} with {len} elements")]
    IndexOutOfRange {
        name: String,
        index: usize,
        len: usize,
    },

    #[error("container {0:?} has a fixed size")]
    FixedSize(String),

    #[error("no row at path {0:?}")]
    UnknownPath(String),

    #[error("cannot apply value: {0}")]
    Apply(String),
}
