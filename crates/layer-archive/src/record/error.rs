use crate::nn::ConstructionError;

/// Error raised while saving or loading a graph.
///
/// None of these are retried; a failed call leaves nothing behind, neither a partial archive
/// nor a partial graph.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ArchiveError {
    /// A size does not fit in the archive's `u32` size type.
    #[error("size {0} does not fit in the archive's 32-bit size type")]
    Range(usize),

    /// The archive does not match the schema of the kind being read.
    #[error("schema error: {0}")]
    Schema(String),

    /// The archive names a kind that has no schema.
    #[error("unknown layer kind `{0}`")]
    UnknownKind(String),

    /// The kind's constructor rejected the archived configuration.
    #[error(transparent)]
    Construction(#[from] ConstructionError),

    /// File not found.
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// The archive transport failed.
    #[error("io error: {0}")]
    Io(String),
}

impl ArchiveError {
    pub(crate) fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }
}
