mod common;
mod error;
mod generation;
mod model_config;

pub use common::OneOrMany;
pub use error::ConfigError;
pub use generation::GenerationConfig;
pub use model_config::ModelConfig;
