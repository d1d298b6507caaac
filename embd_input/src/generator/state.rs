use crate::{model::TokenId, session::types::FinishReason};

/// Steps of the sample, emit, feed loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
    Ready,
    Sampling,
    /// A token was sampled and is about to be decoded and handed out.
    Emitting(TokenId),
    /// A token was handed out and must be fed back into the cache.
    Feeding(TokenId),
    Done(FinishReason),
}

impl GenerationState {
    pub fn is_done(&self) -> bool {
        matches!(self, GenerationState::Done(_))
    }

    pub fn finish_reason(&self) -> Option<FinishReason> {
        match self {
            GenerationState::Done(reason) => Some(*reason),
            _ => None,
        }
    }
}
