use crate::{
    config::GenerationConfig, session::parameter::ConfigResolvableValue,
};

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SamplingMethod {
    Greedy,
    Temperature {
        temperature: f32,
    },
    TopK {
        top_k: usize,
        temperature: f32,
    },
    TopP {
        top_p: f32,
        temperature: f32,
    },
    MinP {
        min_p: f32,
        temperature: f32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SamplingPolicy {
    Default,
    Custom {
        value: SamplingMethod,
    },
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        SamplingPolicy::Default
    }
}

impl ConfigResolvableValue<GenerationConfig, SamplingMethod>
    for SamplingPolicy
{
    fn resolve(
        &self,
        generation_config: &GenerationConfig,
    ) -> SamplingMethod {
        match self {
            SamplingPolicy::Default => {
                let temperature = generation_config.temperature.unwrap_or(1.0);
                if temperature <= 0.0 {
                    return SamplingMethod::Greedy;
                }
                if let Some(top_p) = generation_config.top_p {
                    return SamplingMethod::TopP {
                        top_p,
                        temperature,
                    };
                }
                if let Some(top_k) = generation_config.top_k {
                    return SamplingMethod::TopK {
                        top_k: top_k as usize,
                        temperature,
                    };
                }
                if let Some(min_p) = generation_config.min_p {
                    return SamplingMethod::MinP {
                        min_p,
                        temperature,
                    };
                }
                if let Some(temperature) = generation_config.temperature {
                    return SamplingMethod::Temperature {
                        temperature,
                    };
                }
                SamplingMethod::Greedy
            },
            SamplingPolicy::Custom {
                value,
            } => *value,
        }
    }
}
