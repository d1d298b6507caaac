use crate::session::parameter::{PenaltyPolicy, SamplingPolicy};

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub tokens_limit: u64,
    pub sampling_policy: SamplingPolicy,
    pub penalty_policy: PenaltyPolicy,
    /// Finish when the model's end-of-sequence token is sampled.
    pub stop_on_eos: bool,
}

impl RunConfig {
    pub fn new(
        tokens_limit: u64,
        sampling_policy: SamplingPolicy,
    ) -> Self {
        Self {
            tokens_limit,
            sampling_policy,
            penalty_policy: PenaltyPolicy::default(),
            stop_on_eos: true,
        }
    }

    pub fn tokens_limit(
        mut self,
        tokens_limit: u64,
    ) -> Self {
        self.tokens_limit = tokens_limit;
        self
    }

    pub fn sampling_policy(
        mut self,
        sampling_policy: SamplingPolicy,
    ) -> Self {
        self.sampling_policy = sampling_policy;
        self
    }

    pub fn penalty_policy(
        mut self,
        penalty_policy: PenaltyPolicy,
    ) -> Self {
        self.penalty_policy = penalty_policy;
        self
    }

    pub fn stop_on_eos(
        mut self,
        stop_on_eos: bool,
    ) -> Self {
        self.stop_on_eos = stop_on_eos;
        self
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new(1024, SamplingPolicy::Default)
    }
}
