use thiserror::Error;

/// Result type for feature conversion
pub type Result<T> = std::result::Result<T, FeatureError>;

/// Errors raised while turning raw examples into model features.
///
/// Apart from `Tokenizer`, `Io` and `Serialization`, every variant signals a
/// logic defect or unvalidated training data; callers should abort the run
/// instead of retrying.
#[derive(Error, Debug)]
pub enum FeatureError {
    /// The subword tokenizer or its normalizer failed
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// Invalid converter configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An index lookup was attempted on a map without a single anchor
    #[error("No anchor to resolve position {position} (map length {len})")]
    UnanchoredIndex { position: usize, len: usize },

    /// Assembled arrays do not have the expected length
    #[error("Feature array '{field}' has length {actual}, expected {expected}")]
    ShapeMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Training example whose gold answer is missing or inconsistent
    #[error("Malformed example '{example_id}': {reason}")]
    MalformedExample { example_id: String, reason: String },

    /// Gold answer resolved to a start token after its end token
    #[error("Answer of example '{example_id}' resolved to tokens {start}..{end}")]
    InvertedAnswerSpan {
        example_id: String,
        start: usize,
        end: usize,
    },

    /// IO error while writing features
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Feature serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FeatureError {
    /// Create a tokenizer error
    pub fn tokenizer(msg: impl Into<String>) -> Self {
        Self::Tokenizer(msg.into())
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a malformed example error
    pub fn malformed(example_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedExample {
            example_id: example_id.into(),
            reason: reason.into(),
        }
    }

    /// Create a shape mismatch error
    pub const fn shape(field: &'static str, expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch {
            field,
            expected,
            actual,
        }
    }
}
