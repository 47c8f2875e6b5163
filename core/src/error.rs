//! Error types for douggle-core.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Empty or missing document collection, duplicate identifiers, bad batch shapes.
    #[error("invalid input: {0}")]
    Input(String),
    /// The caller asked for a non-trivial index but no term survived normalization.
    #[error("index has an empty vocabulary")]
    EmptyVocabulary,
    /// A persisted snapshot could not be decoded or is internally inconsistent.
    #[error("cache corrupted: {0}")]
    CacheCorruption(String),
    /// A term index points outside the vocabulary it was built against.
    #[error("term index {index} outside vocabulary of {size} terms")]
    VocabularyMismatch { index: usize, size: usize },
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Store(#[from] sled::Error),
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}
