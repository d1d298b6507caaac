mod context_length;
mod penalty_policy;
mod prefill_step_size;
mod sampling_policy;
mod sampling_seed;

pub use context_length::ContextLength;
pub use penalty_policy::{Penalties, PenaltyPolicy};
pub use prefill_step_size::PrefillStepSize;
pub use sampling_policy::{SamplingMethod, SamplingPolicy};
pub use sampling_seed::SamplingSeed;

/// A parameter that picks its concrete value on its own, once per session.
pub trait ResolvableValue<Value> {
    fn resolve(&self) -> Value;
}

/// A parameter whose concrete value depends on the loaded model, for example
/// its maximal context or its shipped generation defaults.
pub trait ConfigResolvableValue<Config, Value> {
    fn resolve(
        &self,
        config: &Config,
    ) -> Value;
}
