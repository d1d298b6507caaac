use ndarray::{Array1, Array2, ArrayView1, s};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    config::ModelConfig,
    model::{
        EvaluationItems, ModelContext, ModelError, TokenDecoder, TokenId,
    },
};

const DEFAULT_WEIGHTS_SEED: u64 = 42;

#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceModelConfig {
    pub vocabulary_size: usize,
    pub embedding_width: usize,
    pub context_length: usize,
    pub weights_seed: u64,
    pub bos_token: Option<TokenId>,
    pub eos_tokens: Vec<TokenId>,
}

impl From<&ModelConfig> for ReferenceModelConfig {
    fn from(config: &ModelConfig) -> Self {
        Self {
            vocabulary_size: config.vocab_size,
            embedding_width: config.embedding_width,
            context_length: config.context_length,
            weights_seed: config.seed.unwrap_or(DEFAULT_WEIGHTS_SEED),
            bos_token: config.bos_token_id,
            eos_tokens: config.stop_token_ids(),
        }
    }
}

/// Single-layer causal model on the CPU.
///
/// Weights are drawn from a seeded generator, so two models built from the
/// same config produce identical logits. The output head is tied to the
/// token embedding table.
pub struct ReferenceModel {
    config: ReferenceModelConfig,
    token_embeddings: Array2<f32>,
    cache: Array2<f32>,
    cached_positions: usize,
    decoder: Box<dyn TokenDecoder>,
}

impl ReferenceModel {
    pub fn new(
        config: ReferenceModelConfig,
        decoder: Box<dyn TokenDecoder>,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(config.weights_seed);
        let scale = 1.0 / (config.embedding_width as f32).sqrt();
        let token_embeddings = Array2::from_shape_fn(
            (config.vocabulary_size, config.embedding_width),
            |_| rng.random_range(-scale..scale),
        );
        let cache =
            Array2::zeros((config.context_length, config.embedding_width));

        Self {
            config,
            token_embeddings,
            cache,
            cached_positions: 0,
            decoder,
        }
    }

    pub fn cached_positions(&self) -> usize {
        self.cached_positions
    }

    pub fn token_embedding(
        &self,
        token_id: TokenId,
    ) -> Option<ArrayView1<'_, f32>> {
        let index = token_id as usize;
        if index < self.config.vocabulary_size {
            Some(self.token_embeddings.row(index))
        } else {
            None
        }
    }

    fn validate(
        &self,
        items: &EvaluationItems<'_>,
    ) -> Result<(), ModelError> {
        match items {
            EvaluationItems::Tokens(tokens) => {
                let vocabulary_size = self.config.vocabulary_size;
                if let Some(token) = tokens
                    .iter()
                    .find(|&&token| token as usize >= vocabulary_size)
                {
                    return Err(ModelError::Evaluation(format!(
                        "token {} is outside of vocabulary",
                        token
                    )));
                }
            },
            EvaluationItems::Embeddings(rows) => {
                if rows.ncols() != self.config.embedding_width {
                    return Err(ModelError::Evaluation(format!(
                        "embedding width {} does not match model width {}",
                        rows.ncols(),
                        self.config.embedding_width
                    )));
                }
            },
        }
        Ok(())
    }

    fn last_position_logits(&self) -> Array1<f32> {
        let keys = self.cache.slice(s![..self.cached_positions, ..]);
        let query = self.cache.row(self.cached_positions - 1);

        let scale = 1.0 / (self.config.embedding_width as f32).sqrt();
        let mut weights = keys.dot(&query) * scale;
        let max_score = weights.fold(f32::NEG_INFINITY, |a, &b| a.max(b));
        weights.mapv_inplace(|score| (score - max_score).exp());
        let sum = weights.sum();
        weights /= sum;

        let hidden = keys.t().dot(&weights) + query;
        self.token_embeddings.dot(&hidden)
    }
}

impl ModelContext for ReferenceModel {
    fn embedding_width(&self) -> usize {
        self.config.embedding_width
    }

    fn vocabulary_size(&self) -> usize {
        self.config.vocabulary_size
    }

    fn max_context_length(&self) -> usize {
        self.config.context_length
    }

    fn evaluate(
        &mut self,
        position_start: usize,
        items: EvaluationItems<'_>,
    ) -> Result<Array1<f32>, ModelError> {
        if position_start != self.cached_positions {
            return Err(ModelError::PositionMismatch {
                expected: self.cached_positions,
                actual: position_start,
            });
        }
        if items.is_empty() {
            return Err(ModelError::Evaluation(String::from(
                "nothing to evaluate",
            )));
        }
        if position_start + items.len() > self.config.context_length {
            return Err(ModelError::Capacity);
        }
        self.validate(&items)?;

        match items {
            EvaluationItems::Tokens(tokens) => {
                for (offset, &token) in tokens.iter().enumerate() {
                    let embedding = self.token_embeddings.row(token as usize);
                    self.cache
                        .row_mut(position_start + offset)
                        .assign(&embedding);
                }
            },
            EvaluationItems::Embeddings(rows) => {
                let end = position_start + rows.nrows();
                self.cache.slice_mut(s![position_start..end, ..]).assign(&rows);
            },
        }
        self.cached_positions += items.len();

        Ok(self.last_position_logits())
    }

    fn decode(
        &self,
        token_id: TokenId,
    ) -> Result<String, ModelError> {
        self.decoder.decode_token(token_id)
    }

    fn bos_token(&self) -> Option<TokenId> {
        self.config.bos_token
    }

    fn eos_tokens(&self) -> Vec<TokenId> {
        self.config.eos_tokens.clone()
    }

    fn reset(&mut self) {
        self.cache.fill(0.0);
        self.cached_positions = 0;
    }
}
