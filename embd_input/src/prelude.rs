//! Commonly used types, importable with `use embd_input::prelude::*;`.

pub use crate::{
    VERSION,
    generator::{
        CancellationHandle, CancellationToken, Generation, GenerationState,
    },
    model::{ModelContext, SegmentEncoder, TokenDecoder, TokenId},
    sampling::Sampler,
    session::{
        Session,
        config::{DecodingConfig, RunConfig},
        parameter::{
            ContextLength, Penalties, PenaltyPolicy, PrefillStepSize,
            SamplingMethod, SamplingPolicy, SamplingSeed,
        },
        types::{
            EmbeddingBatch, Error, FinishReason, Fragment, GenerationFailure,
            Output, Segment, Stats, StepStats, TotalStats,
        },
    },
};
