use std::iter::FusedIterator;

use log::{debug, warn};

use super::{CancellationToken, GenerationState};
use crate::{
    model::TokenId,
    sampling::Sampler,
    session::{
        Session,
        parameter::{Penalties, SamplingMethod},
        types::{Error, FinishReason, Fragment, GenerationFailure},
    },
};

/// A lazy, finite stream of decoded fragments, one per sampled token.
///
/// Every fragment handed out is fed back into the session on the following
/// call to `next`, so the session position grows by one per fragment. Once
/// the stream reaches `Done` the session refuses further evaluation until it
/// is reset.
pub struct Generation<'a> {
    session: &'a mut Session,
    sampler: Sampler,
    method: SamplingMethod,
    penalties: Penalties,
    stop_tokens: Vec<TokenId>,
    tokens_limit: usize,
    emitted: usize,
    state: GenerationState,
    cancellation: CancellationToken,
    cancel_requested: bool,
}

impl<'a> Generation<'a> {
    pub fn new(
        session: &'a mut Session,
        sampler: Sampler,
        method: SamplingMethod,
        penalties: Penalties,
        stop_tokens: Vec<TokenId>,
        tokens_limit: usize,
    ) -> Self {
        Self {
            session,
            sampler,
            method,
            penalties,
            stop_tokens,
            tokens_limit,
            emitted: 0,
            state: GenerationState::Ready,
            cancellation: CancellationToken::default(),
            cancel_requested: false,
        }
    }

    pub fn with_cancellation(
        mut self,
        cancellation: CancellationToken,
    ) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Requests a stop. A fragment already handed out is still fed, then the
    /// stream ends with `Cancelled`.
    pub fn cancel(&mut self) {
        self.cancel_requested = true;
    }

    pub fn state(&self) -> GenerationState {
        self.state
    }

    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.state.finish_reason()
    }

    pub fn emitted(&self) -> usize {
        self.emitted
    }

    pub fn position(&self) -> usize {
        self.session.position()
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_requested || self.cancellation.is_cancelled()
    }

    fn finish(
        &mut self,
        reason: FinishReason,
    ) {
        debug!(
            "Generation done: {:?} after {} tokens at position {}",
            reason,
            self.emitted,
            self.session.position()
        );
        self.state = GenerationState::Done(reason);
        self.session.mark_finished();
    }

    fn fail(
        &mut self,
        error: Error,
    ) -> GenerationFailure {
        let position = self.session.position();
        warn!("Generation failed at position {}: {}", position, error);
        self.finish(FinishReason::Failed);
        GenerationFailure {
            error,
            position,
        }
    }
}

impl Iterator for Generation<'_> {
    type Item = Result<Fragment, GenerationFailure>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.state {
                GenerationState::Ready => {
                    if self.emitted >= self.tokens_limit {
                        self.finish(FinishReason::Length);
                    } else if self.is_cancelled() {
                        self.finish(FinishReason::Cancelled);
                    } else {
                        self.state = GenerationState::Sampling;
                    }
                },
                GenerationState::Sampling => {
                    let token = match self.session.sample(
                        &mut self.sampler,
                        &self.method,
                        &self.penalties,
                    ) {
                        Ok(token) => token,
                        Err(error) => return Some(Err(self.fail(error))),
                    };
                    if self.stop_tokens.contains(&token) {
                        self.finish(FinishReason::Stop);
                    } else {
                        self.state = GenerationState::Emitting(token);
                    }
                },
                GenerationState::Emitting(token) => {
                    let text = match self.session.decode(token) {
                        Ok(text) => text,
                        Err(error) => return Some(Err(self.fail(error))),
                    };
                    let fragment = Fragment {
                        index: self.emitted,
                        token,
                        text,
                    };
                    self.emitted += 1;
                    self.state = GenerationState::Feeding(token);
                    return Some(Ok(fragment));
                },
                GenerationState::Feeding(token) => {
                    if let Err(error) = self.session.evaluate_token(token) {
                        return Some(Err(self.fail(error)));
                    }
                    self.state = GenerationState::Ready;
                },
                GenerationState::Done(_) => return None,
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.state {
            GenerationState::Done(_) => (0, Some(0)),
            _ => (0, Some(self.tokens_limit.saturating_sub(self.emitted) + 1)),
        }
    }
}

impl FusedIterator for Generation<'_> {}

impl Drop for Generation<'_> {
    fn drop(&mut self) {
        if !self.state.is_done() {
            self.state = GenerationState::Done(FinishReason::Cancelled);
            self.session.mark_finished();
        }
    }
}
