#[cfg(test)]
#[macro_use]
extern crate is_close;

pub mod backends;
pub mod config;
pub mod generator;
pub mod model;
pub mod prelude;
pub mod sampling;
pub mod session;

pub use model::{
    EvaluationItems, ModelContext, ModelError, SegmentEncoder, TokenDecoder,
    TokenId,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
