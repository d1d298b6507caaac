use crate::{
    config::ConfigError,
    model::{ModelError, TokenId},
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Model folder not found")]
    ModelFolderNotFound,
    #[error("Unable to load model configuration: {0}")]
    UnableToLoadConfig(#[from] ConfigError),
    #[error("Unable to load tokenizer")]
    UnableToLoadTokenizer,
    #[error("Unable to tokenize text: {reason}")]
    Tokenization {
        reason: String,
    },
    #[error(
        "Embedding {index} has width {actual}, model expects {expected}"
    )]
    DimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },
    #[error(
        "Context overflow: {requested} positions requested at position {position}, capacity is {capacity}"
    )]
    ContextOverflow {
        position: usize,
        requested: usize,
        capacity: usize,
    },
    #[error("Token {token} is outside of vocabulary of size {vocabulary_size}")]
    InvalidToken {
        token: TokenId,
        vocabulary_size: usize,
    },
    #[error("No logits available, nothing was evaluated yet")]
    EmptyLogits,
    #[error("Segment contains no positions")]
    EmptySegment,
    #[error("Model evaluation failed: {reason}")]
    Evaluation {
        reason: String,
    },
    #[error("Unable to decode text: {reason}")]
    UnableToDecodeText {
        reason: String,
    },
    #[error("Generation finished, reset the session first")]
    GenerationFinished,
}

impl From<ModelError> for Error {
    fn from(value: ModelError) -> Self {
        match value {
            ModelError::Tokenization(reason) => Self::Tokenization {
                reason,
            },
            ModelError::Decoding(reason) => Self::UnableToDecodeText {
                reason,
            },
            other => Self::Evaluation {
                reason: other.to_string(),
            },
        }
    }
}

/// The first error of a generation together with the position counter at
/// the moment it was raised.
#[derive(Debug, thiserror::Error)]
#[error("{error} (position {position})")]
pub struct GenerationFailure {
    #[source]
    pub error: Error,
    pub position: usize,
}
