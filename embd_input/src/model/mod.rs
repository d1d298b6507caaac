mod context;
mod encoder;
mod error;

pub use context::{EvaluationItems, ModelContext};
pub use encoder::{SegmentEncoder, TokenDecoder};
pub use error::ModelError;

pub type TokenId = u32;
