use std::{path::PathBuf, time::Instant};

use log::{debug, info, warn};
use ndarray::{Array1, s};
use tokenizers::Tokenizer;

use crate::{
    backends::cpu::{ReferenceModel, ReferenceModelConfig},
    config::{GenerationConfig, ModelConfig},
    generator::Generation,
    model::{EvaluationItems, ModelContext, SegmentEncoder, TokenId},
    sampling::Sampler,
    session::{
        config::{DecodingConfig, RunConfig},
        parameter::{
            ConfigResolvableValue, Penalties, ResolvableValue, SamplingMethod,
        },
        types::{
            EmbeddingBatch, Error, GenerationFailure, Output, Segment, Stats,
            StepStats, TotalStats,
        },
    },
};

/// Generation state for one model context.
///
/// The position counter is the only record of where the next evaluation
/// starts. It always equals the number of positions the model's cache has
/// accepted, and every evaluation call appends right after it.
pub struct Session {
    model: Box<dyn ModelContext>,
    encoder: Box<dyn SegmentEncoder>,
    decoding_config: DecodingConfig,
    generation_config: GenerationConfig,
    context_length: usize,
    prefill_step_size: usize,
    sampling_seed: u64,

    position: usize,
    logits: Option<Array1<f32>>,
    history: Vec<TokenId>,
    model_runs: u64,
    is_finished: bool,
}

impl Session {
    pub fn new(
        model: Box<dyn ModelContext>,
        encoder: Box<dyn SegmentEncoder>,
        decoding_config: DecodingConfig,
    ) -> Self {
        let context_length = decoding_config
            .context_length
            .resolve(&model.max_context_length());
        let prefill_step_size =
            decoding_config.prefill_step_size.resolve(&context_length);
        let sampling_seed = decoding_config.sampling_seed.resolve();

        debug!(
            "Session created: context length {}, prefill step {}, seed {}",
            context_length, prefill_step_size, sampling_seed
        );

        Self {
            model,
            encoder,
            decoding_config,
            generation_config: GenerationConfig::default(),
            context_length,
            prefill_step_size,
            sampling_seed,
            position: 0,
            logits: None,
            history: Vec::new(),
            model_runs: 0,
            is_finished: false,
        }
    }

    /// Loads `config.json`, `generation_config.json` and `tokenizer.json`
    /// from a model folder and runs them on the CPU reference model.
    pub fn load(
        model_path: PathBuf,
        decoding_config: DecodingConfig,
    ) -> Result<Self, Error> {
        if !model_path.exists() {
            return Err(Error::ModelFolderNotFound);
        }

        let model_config = ModelConfig::load(&model_path)?;

        let tokenizer_path = model_path.join("tokenizer.json");
        if !tokenizer_path.exists() {
            return Err(Error::UnableToLoadTokenizer);
        }
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|_| Error::UnableToLoadTokenizer)?;

        let tokenizer_vocabulary_size = tokenizer.get_vocab_size(true);
        if tokenizer_vocabulary_size > model_config.vocab_size {
            warn!(
                "Tokenizer knows {} tokens, model vocabulary has {}",
                tokenizer_vocabulary_size, model_config.vocab_size
            );
        }

        let model = ReferenceModel::new(
            ReferenceModelConfig::from(&model_config),
            Box::new(tokenizer.clone()),
        );
        info!(
            "Loaded model from {:?}: vocabulary {}, width {}, context {}",
            model_path,
            model_config.vocab_size,
            model_config.embedding_width,
            model_config.context_length
        );

        Ok(Self::new(Box::new(model), Box::new(tokenizer), decoding_config)
            .with_generation_config(model_config.generation_config))
    }

    pub fn with_generation_config(
        mut self,
        generation_config: GenerationConfig,
    ) -> Self {
        self.generation_config = generation_config;
        self
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Positions this session may commit in total.
    pub fn capacity(&self) -> usize {
        self.context_length
    }

    pub fn logits(&self) -> Option<&Array1<f32>> {
        self.logits.as_ref()
    }

    /// Token ids committed so far. Embedding positions have no token.
    pub fn history(&self) -> &[TokenId] {
        &self.history
    }

    pub fn is_finished(&self) -> bool {
        self.is_finished
    }

    pub fn embedding_width(&self) -> usize {
        self.model.embedding_width()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.model.vocabulary_size()
    }

    pub fn decoding_config(&self) -> &DecodingConfig {
        &self.decoding_config
    }

    pub fn generation_config(&self) -> &GenerationConfig {
        &self.generation_config
    }

    pub fn sampling_seed(&self) -> u64 {
        self.sampling_seed
    }

    pub fn model_runs(&self) -> u64 {
        self.model_runs
    }

    /// Drops the cache and every committed position.
    pub fn reset(&mut self) {
        self.model.reset();
        self.position = 0;
        self.logits = None;
        self.history.clear();
        self.model_runs = 0;
        self.is_finished = false;
        debug!("Session reset");
    }
}

impl Session {
    pub fn evaluate_text(
        &mut self,
        text: &str,
    ) -> Result<(), Error> {
        self.ensure_active()?;

        let mut tokens = self.encoder.tokenize(text)?;
        if tokens.is_empty() {
            return Err(Error::EmptySegment);
        }
        if self.decoding_config.add_bos_token && self.position == 0 {
            if let Some(bos_token) = self.model.bos_token() {
                tokens.insert(0, bos_token);
            }
        }
        self.validate_tokens(&tokens)?;
        self.check_capacity(tokens.len())?;

        for chunk in tokens.chunks(self.prefill_step_size) {
            self.commit(EvaluationItems::Tokens(chunk))?;
            self.history.extend_from_slice(chunk);
        }
        Ok(())
    }

    pub fn evaluate_embeddings(
        &mut self,
        batch: &EmbeddingBatch,
    ) -> Result<(), Error> {
        self.ensure_active()?;

        if batch.is_empty() {
            return Err(Error::EmptySegment);
        }
        let rows = batch.to_array(self.model.embedding_width())?;
        self.check_capacity(batch.count())?;

        let mut start = 0;
        while start < rows.nrows() {
            let end =
                std::cmp::min(start + self.prefill_step_size, rows.nrows());
            let chunk = rows.slice(s![start..end, ..]);
            self.commit(EvaluationItems::Embeddings(chunk))?;
            start = end;
        }
        Ok(())
    }

    pub fn evaluate_token(
        &mut self,
        token_id: TokenId,
    ) -> Result<(), Error> {
        self.ensure_active()?;

        self.validate_tokens(&[token_id])?;
        self.check_capacity(1)?;

        self.commit(EvaluationItems::Tokens(&[token_id]))?;
        self.history.push(token_id);
        Ok(())
    }

    pub fn evaluate_segment(
        &mut self,
        segment: &Segment,
    ) -> Result<(), Error> {
        match segment {
            Segment::Text(text) => self.evaluate_text(text),
            Segment::Embeddings(batch) => self.evaluate_embeddings(batch),
        }
    }

    /// Evaluates segments in order, stopping at the first failure.
    pub fn evaluate_segments(
        &mut self,
        segments: &[Segment],
    ) -> Result<(), Error> {
        for segment in segments {
            self.evaluate_segment(segment)?;
        }
        Ok(())
    }

    /// Samples from the logits of the latest evaluation.
    pub fn sample(
        &self,
        sampler: &mut Sampler,
        method: &SamplingMethod,
        penalties: &Penalties,
    ) -> Result<TokenId, Error> {
        let logits = self.logits.as_ref().ok_or(Error::EmptyLogits)?;
        sampler.sample(logits, method, penalties, &self.history)
    }

    pub fn decode(
        &self,
        token_id: TokenId,
    ) -> Result<String, Error> {
        Ok(self.model.decode(token_id)?)
    }
}

impl Session {
    /// Starts the sample, emit, feed loop over the current logits.
    pub fn generate(
        &mut self,
        config: RunConfig,
    ) -> Result<Generation<'_>, Error> {
        self.ensure_active()?;

        let method = config.sampling_policy.resolve(&self.generation_config);
        let penalties = config.penalty_policy.resolve(&self.generation_config);
        let stop_tokens = if config.stop_on_eos {
            self.stop_tokens()
        } else {
            Vec::new()
        };
        let sampler = Sampler::new(self.sampling_seed);

        debug!(
            "Generation started at position {}: {:?}, limit {}",
            self.position, method, config.tokens_limit
        );

        Ok(Generation::new(
            self,
            sampler,
            method,
            penalties,
            stop_tokens,
            config.tokens_limit as usize,
        ))
    }

    /// Evaluates `segments` as the prompt and generates a continuation.
    ///
    /// `progress` sees the output after every emitted fragment; returning
    /// `false` cancels the generation.
    pub fn run<F>(
        &mut self,
        segments: &[Segment],
        config: RunConfig,
        mut progress: Option<F>,
    ) -> Result<Output, GenerationFailure>
    where
        F: FnMut(&Output) -> bool,
    {
        let run_start = Instant::now();
        let position_before = self.position;
        let model_runs_before = self.model_runs;

        if let Err(error) = self.evaluate_segments(segments) {
            return Err(GenerationFailure {
                error,
                position: self.position,
            });
        }
        let prefill_stats = StepStats::new(
            run_start.elapsed().as_secs_f64(),
            (self.position - position_before) as u64,
            self.model_runs - model_runs_before,
        );

        let generate_start = Instant::now();
        let model_runs_before = self.model_runs;
        let position = self.position;
        let mut generation = match self.generate(config) {
            Ok(generation) => generation,
            Err(error) => {
                return Err(GenerationFailure {
                    error,
                    position,
                });
            },
        };

        let mut output = Output {
            text: String::new(),
            tokens: Vec::new(),
            stats: Stats {
                prefill_stats: prefill_stats.clone(),
                generate_stats: None,
                total_stats: TotalStats::default(),
            },
            finish_reason: None,
        };

        while let Some(item) = generation.next() {
            let fragment = item?;
            output.text.push_str(&fragment.text);
            output.tokens.push(fragment.token);

            if let Some(progress) = progress.as_mut() {
                if !progress(&output) {
                    generation.cancel();
                }
            }
        }
        output.finish_reason = generation.finish_reason();
        drop(generation);

        let generate_stats = StepStats::new(
            generate_start.elapsed().as_secs_f64(),
            output.tokens.len() as u64,
            self.model_runs - model_runs_before,
        );
        output.stats = Stats {
            prefill_stats: prefill_stats.clone(),
            generate_stats: Some(generate_stats),
            total_stats: TotalStats {
                duration: run_start.elapsed().as_secs_f64(),
                positions_count_input: prefill_stats.positions_count,
                tokens_count_output: output.tokens.len() as u64,
            },
        };

        info!(
            "Generated {} tokens, finish reason {:?}, position {}",
            output.tokens.len(),
            output.finish_reason,
            self.position
        );
        Ok(output)
    }

    pub(crate) fn mark_finished(&mut self) {
        self.is_finished = true;
    }
}

impl Session {
    fn ensure_active(&self) -> Result<(), Error> {
        if self.is_finished {
            return Err(Error::GenerationFinished);
        }
        Ok(())
    }

    /// Model EOS ids followed by the generation config's stop ids.
    fn stop_tokens(&self) -> Vec<TokenId> {
        let mut tokens = self.model.eos_tokens();
        for token in &self.generation_config.stop_token_ids {
            if !tokens.contains(token) {
                tokens.push(*token);
            }
        }
        tokens
    }

    fn validate_tokens(
        &self,
        tokens: &[TokenId],
    ) -> Result<(), Error> {
        let vocabulary_size = self.model.vocabulary_size();
        match tokens
            .iter()
            .find(|&&token| token as usize >= vocabulary_size)
        {
            Some(&token) => Err(Error::InvalidToken {
                token,
                vocabulary_size,
            }),
            None => Ok(()),
        }
    }

    fn check_capacity(
        &self,
        requested: usize,
    ) -> Result<(), Error> {
        if self.position + requested > self.context_length {
            return Err(Error::ContextOverflow {
                position: self.position,
                requested,
                capacity: self.context_length,
            });
        }
        Ok(())
    }

    /// Hands one chunk to the model and advances the counter by the number
    /// of positions it accepted.
    fn commit(
        &mut self,
        items: EvaluationItems<'_>,
    ) -> Result<(), Error> {
        let count = items.len();
        let position = self.position;
        let logits = self.model.evaluate(position, items).map_err(|err| {
            warn!("Evaluation failed at position {}: {}", position, err);
            Error::from(err)
        })?;
        self.model_runs += 1;
        debug!("Evaluated {} positions at {}", count, position);

        self.position += count;
        self.logits = Some(logits);
        Ok(())
    }
}
