//! Error types for the prediction engine

use thiserror::Error;

use crate::store::StoreError;

/// Contract violations on the prefix tree
#[derive(Debug, Error)]
pub enum TreeError {
    /// Word contains digits, punctuation, or letters the tree cannot hold
    #[error("invalid word '{0}': only the letters a-z are accepted")]
    InvalidWord(String),

    /// Training a path that was never inserted
    #[error("cannot train '{0}': the word was never inserted")]
    UntrainedPath(String),
}

/// Errors surfaced by [`PredictionEngine`](crate::engine::predictor::PredictionEngine)
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// The in-memory update succeeded but the storage collaborator did not
    #[error("failed to store new word '{word}': {source}")]
    Storage {
        word: String,
        #[source]
        source: StoreError,
    },
}

pub type Result<T> = std::result::Result<T, EngineError>;
