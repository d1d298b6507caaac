mod decoding_config;
mod run_config;

pub use decoding_config::DecodingConfig;
pub use run_config::RunConfig;
