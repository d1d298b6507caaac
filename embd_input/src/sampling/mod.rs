pub mod processors;
mod sampler;

pub use sampler::Sampler;
