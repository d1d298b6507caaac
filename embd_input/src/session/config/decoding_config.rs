use crate::session::parameter::{ContextLength, PrefillStepSize, SamplingSeed};

#[derive(Debug, Clone)]
pub struct DecodingConfig {
    pub context_length: ContextLength,
    pub prefill_step_size: PrefillStepSize,
    pub sampling_seed: SamplingSeed,
    /// Prepend the model's BOS token to the first text segment of a session.
    pub add_bos_token: bool,
}

impl DecodingConfig {
    pub fn new(
        context_length: ContextLength,
        prefill_step_size: PrefillStepSize,
        sampling_seed: SamplingSeed,
        add_bos_token: bool,
    ) -> Self {
        Self {
            context_length,
            prefill_step_size,
            sampling_seed,
            add_bos_token,
        }
    }
}

impl Default for DecodingConfig {
    fn default() -> Self {
        Self {
            context_length: ContextLength::default(),
            prefill_step_size: PrefillStepSize::default(),
            sampling_seed: SamplingSeed::default(),
            add_bos_token: true,
        }
    }
}
