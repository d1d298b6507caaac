use crate::session::parameter::ResolvableValue;

/// Seed of the sampler's random generator. A session resolves it once, so
/// every generation of that session starts from the same seed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SamplingSeed {
    /// Drawn from the thread-local generator.
    #[default]
    Default,
    Custom(u64),
}

impl From<u64> for SamplingSeed {
    fn from(seed: u64) -> Self {
        SamplingSeed::Custom(seed)
    }
}

impl ResolvableValue<u64> for SamplingSeed {
    fn resolve(&self) -> u64 {
        match self {
            SamplingSeed::Default => rand::random::<u64>(),
            SamplingSeed::Custom(seed) => *seed,
        }
    }
}
