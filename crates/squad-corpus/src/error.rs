use qa_span_features::FeatureError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CorpusError>;

/// Errors raised while reading a SQuAD-format corpus or writing features
#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Dataset file missing; the run cannot continue without it
    #[error("Data path not found: {0}")]
    NotFound(PathBuf),

    /// Question that violates the training-data contract
    #[error("Malformed question '{id}': {reason}")]
    Malformed { id: String, reason: String },

    #[error(transparent)]
    Feature(#[from] FeatureError),
}

impl CorpusError {
    pub fn malformed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            id: id.into(),
            reason: reason.into(),
        }
    }
}
