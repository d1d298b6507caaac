mod error;
mod output;
mod segment;
mod stats;

pub use error::{Error, GenerationFailure};
pub use output::{FinishReason, Fragment, Output};
pub use segment::{EmbeddingBatch, Segment};
pub use stats::{Stats, StepStats, TotalStats};
