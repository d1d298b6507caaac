use crate::{
    config::GenerationConfig, session::parameter::ConfigResolvableValue,
};

/// Penalties applied to tokens seen in the last `repeat_last_n` evaluated
/// tokens. Embedding positions carry no token and are never penalised.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Penalties {
    pub repeat_last_n: usize,
    pub repetition_penalty: f32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
}

impl Penalties {
    pub fn disabled() -> Self {
        Self {
            repeat_last_n: 0,
            repetition_penalty: 1.0,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.repeat_last_n == 0
            || (self.repetition_penalty == 1.0
                && self.presence_penalty == 0.0
                && self.frequency_penalty == 0.0)
    }
}

impl Default for Penalties {
    fn default() -> Self {
        Self::disabled()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PenaltyPolicy {
    Default,
    Disabled,
    Custom {
        value: Penalties,
    },
}

impl Default for PenaltyPolicy {
    fn default() -> Self {
        PenaltyPolicy::Default
    }
}

impl ConfigResolvableValue<GenerationConfig, Penalties> for PenaltyPolicy {
    fn resolve(
        &self,
        generation_config: &GenerationConfig,
    ) -> Penalties {
        match self {
            PenaltyPolicy::Default => Penalties {
                repeat_last_n: generation_config.repeat_last_n.unwrap_or(64),
                repetition_penalty: generation_config
                    .repetition_penalty
                    .unwrap_or(1.0),
                presence_penalty: generation_config
                    .presence_penalty
                    .unwrap_or(0.0),
                frequency_penalty: generation_config
                    .frequency_penalty
                    .unwrap_or(0.0),
            },
            PenaltyPolicy::Disabled => Penalties::disabled(),
            PenaltyPolicy::Custom {
                value,
            } => *value,
        }
    }
}
