#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Unable to tokenize text: {0}")]
    Tokenization(String),
    #[error("Unable to decode token: {0}")]
    Decoding(String),
    #[error("Evaluation expected to start at {expected}, got {actual}")]
    PositionMismatch {
        expected: usize,
        actual: usize,
    },
    #[error("Cache capacity exhausted")]
    Capacity,
    #[error("Evaluation failed: {0}")]
    Evaluation(String),
}
