use std::{
    io::{Write, stdout},
    path::PathBuf,
    process,
    time::{Duration, Instant},
};

use clap::Args;
use console::Style;
use embd_input::{
    generator::CancellationToken,
    session::{
        Session,
        config::{DecodingConfig, RunConfig},
        parameter::{
            ContextLength, PrefillStepSize, SamplingMethod, SamplingPolicy,
            SamplingSeed,
        },
        types::{Error, FinishReason, GenerationFailure},
    },
};
use indicatif::{ProgressBar, ProgressStyle};
use log::warn;
use rand::{SeedableRng, rngs::StdRng};

use crate::segments::{SegmentSpec, default_segments, load_segments};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Folder with model's files
    pub model_path: String,

    /// Text evaluated after the "assistant:" prefix
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Number of random embedding vectors placed after the question
    #[arg(short, long, default_value_t = 10)]
    pub embeddings: usize,

    /// JSON file with the prompt segments, replaces the default prompt
    #[arg(long)]
    pub segments: Option<PathBuf>,

    /// Maximum tokens to generate
    #[arg(short = 'n', long, default_value_t = 50)]
    pub tokens_limit: u64,

    /// Seed for sampling and for the random embeddings
    #[arg(short, long, default_value_t = 42)]
    pub seed: u64,

    /// Sampling temperature (0.0 = greedy)
    #[arg(short, long)]
    pub temperature: Option<f32>,

    #[arg(long)]
    pub top_k: Option<usize>,

    #[arg(long)]
    pub top_p: Option<f32>,

    /// Largest context the session may use
    #[arg(long)]
    pub context_length: Option<usize>,

    /// Keep generating after the end-of-sequence token
    #[arg(long)]
    pub ignore_eos: bool,
}

impl RunArgs {
    fn sampling_policy(&self) -> SamplingPolicy {
        let temperature = self.temperature.unwrap_or(1.0);
        let method = match (self.top_k, self.top_p, self.temperature) {
            (_, Some(top_p), _) => SamplingMethod::TopP {
                top_p,
                temperature,
            },
            (Some(top_k), None, _) => SamplingMethod::TopK {
                top_k,
                temperature,
            },
            (None, None, Some(temperature)) if temperature <= 0.0 => {
                SamplingMethod::Greedy
            },
            (None, None, Some(temperature)) => SamplingMethod::Temperature {
                temperature,
            },
            (None, None, None) => return SamplingPolicy::Default,
        };
        SamplingPolicy::Custom {
            value: method,
        }
    }

    fn decoding_config(&self) -> DecodingConfig {
        let context_length = match self.context_length {
            Some(value) => ContextLength::Custom(value),
            None => ContextLength::Default,
        };
        DecodingConfig::new(
            context_length,
            PrefillStepSize::Default,
            SamplingSeed::Custom(self.seed),
            true,
        )
    }

    fn segment_specs(&self) -> Vec<SegmentSpec> {
        match &self.segments {
            Some(path) => match load_segments(path) {
                Ok(specs) => specs,
                Err(error) => exit_with_error(&error.to_string()),
            },
            None => default_segments(self.embeddings, self.prompt.clone()),
        }
    }
}

fn exit_with_error(message: &str) -> ! {
    let style_error = Style::new().red().bold();
    eprintln!("{}", style_error.apply_to(message));
    process::exit(1);
}

fn report_failure(
    error: &Error,
    position: usize,
) -> ! {
    exit_with_error(&format!("{} (position {})", error, position));
}

fn build_spinner() -> ProgressBar {
    let progress_bar = ProgressBar::new_spinner();
    progress_bar.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) =
        ProgressStyle::default_spinner().template("{spinner:.green} {msg}")
    {
        progress_bar.set_style(style);
    }
    progress_bar
}

/// Evaluates the prompt segments in order. Returns `Ok(false)` when
/// `cancellation` fires between two segments.
pub(crate) fn evaluate_prompt<F>(
    session: &mut Session,
    specs: Vec<SegmentSpec>,
    rng: &mut StdRng,
    cancellation: &CancellationToken,
    mut on_segment: F,
) -> Result<bool, GenerationFailure>
where
    F: FnMut(usize, usize),
{
    let width = session.embedding_width();
    let count = specs.len();
    for (index, spec) in specs.into_iter().enumerate() {
        if cancellation.is_cancelled() {
            return Ok(false);
        }
        on_segment(index, count);
        let segment = spec.build(width, rng);
        if let Err(error) = session.evaluate_segment(&segment) {
            return Err(GenerationFailure {
                error,
                position: session.position(),
            });
        }
    }
    Ok(true)
}

pub fn handle_run(args: RunArgs) {
    let specs = args.segment_specs();
    let mut session = match Session::load(
        PathBuf::from(&args.model_path),
        args.decoding_config(),
    ) {
        Ok(session) => session,
        Err(error) => exit_with_error(&error.to_string()),
    };

    let (cancellation, handle) = CancellationToken::new();
    if let Err(error) = ctrlc::set_handler(move || handle.cancel()) {
        warn!("Unable to install interrupt handler: {}", error);
    }

    let mut rng = StdRng::seed_from_u64(args.seed);
    let progress_bar = build_spinner();
    let prefill_start = Instant::now();
    let completed = evaluate_prompt(
        &mut session,
        specs,
        &mut rng,
        &cancellation,
        |index, count| {
            progress_bar.set_message(format!(
                "Evaluating segment {}/{}",
                index + 1,
                count
            ))
        },
    );
    progress_bar.finish_and_clear();
    match completed {
        Ok(true) => {},
        Ok(false) => {
            let style_stats = Style::new().bold();
            println!(
                "{}",
                style_stats.apply_to(format!(
                    "cancelled while evaluating the prompt at position {}",
                    session.position()
                ))
            );
            return;
        },
        Err(failure) => report_failure(&failure.error, failure.position),
    }
    let prefill_duration = prefill_start.elapsed().as_secs_f64();
    let prompt_positions = session.position();

    let run_config = RunConfig::new(args.tokens_limit, args.sampling_policy())
        .stop_on_eos(!args.ignore_eos);
    let position = session.position();
    let mut generation = match session.generate(run_config) {
        Ok(generation) => generation.with_cancellation(cancellation),
        Err(error) => report_failure(&error, position),
    };

    let generate_start = Instant::now();
    let mut stdout = stdout();
    for item in generation.by_ref() {
        match item {
            Ok(fragment) => {
                print!("{}", fragment.text);
                let _ = stdout.flush();
            },
            Err(failure) => {
                println!();
                report_failure(&failure.error, failure.position);
            },
        }
    }
    let generate_duration = generate_start.elapsed().as_secs_f64();
    let emitted = generation.emitted();
    let finish_reason = generation.finish_reason();
    drop(generation);
    println!();

    let tokens_per_second = if generate_duration > 0.0 {
        emitted as f64 / generate_duration
    } else {
        0.0
    };
    let style_stats = Style::new().bold();
    println!(
        "\n{}",
        style_stats.apply_to(format!(
            "prompt {} positions in {:.3}s, {} tokens in {:.3}s, {:.3}t/s, {}",
            prompt_positions,
            prefill_duration,
            emitted,
            generate_duration,
            tokens_per_second,
            describe_finish_reason(finish_reason),
        ))
    );
}

fn describe_finish_reason(finish_reason: Option<FinishReason>) -> &'static str {
    match finish_reason {
        Some(FinishReason::Stop) => "stopped at end of sequence",
        Some(FinishReason::Length) => "reached tokens limit",
        Some(FinishReason::Cancelled) => "cancelled",
        Some(FinishReason::Failed) => "failed",
        None => "unfinished",
    }
}
