use ndarray::Array1;
use rand::{Rng, SeedableRng, rngs::StdRng};

use super::processors::{
    apply_penalties, apply_temperature, argmax, min_p_filtering,
    sample_from_probs, softmax, top_k_filtering, top_p_filtering,
};
use crate::{
    model::TokenId,
    session::{
        parameter::{Penalties, SamplingMethod},
        types::Error,
    },
};

/// Picks the next token from a logits vector.
///
/// The only state carried between calls is the random generator, so two
/// samplers created with the same seed return the same tokens for the same
/// sequence of inputs.
pub struct Sampler {
    rng: StdRng,
}

impl Sampler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn sample(
        &mut self,
        logits: &Array1<f32>,
        method: &SamplingMethod,
        penalties: &Penalties,
        history: &[TokenId],
    ) -> Result<TokenId, Error> {
        if logits.is_empty() {
            return Err(Error::EmptyLogits);
        }

        let mut logits = logits.clone();
        apply_penalties(&mut logits, history, penalties);

        let temperature = match *method {
            SamplingMethod::Greedy => return Ok(argmax(&logits)),
            SamplingMethod::Temperature {
                temperature,
            } => temperature,
            SamplingMethod::TopK {
                top_k,
                temperature,
            } => {
                top_k_filtering(&mut logits, top_k);
                temperature
            },
            SamplingMethod::TopP {
                top_p,
                temperature,
            } => {
                top_p_filtering(&mut logits, top_p);
                temperature
            },
            SamplingMethod::MinP {
                min_p,
                temperature,
            } => {
                min_p_filtering(&mut logits, min_p);
                temperature
            },
        };
        if temperature <= 0.0 {
            return Ok(argmax(&logits));
        }

        apply_temperature(&mut logits, temperature);
        let probs = softmax(&logits);
        let uniform: f32 = self.rng.random();
        Ok(sample_from_probs(&probs, uniform))
    }
}
