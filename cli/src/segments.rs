use std::{fs, path::Path};

use embd_input::session::types::{EmbeddingBatch, Segment};
use rand::{Rng, rngs::StdRng};
use serde::{Deserialize, Serialize};

pub const QUESTION: &str = "user: what is the color of the flag of UN?";
pub const ANSWER_PREFIX: &str = "assistant:";

#[derive(Debug, thiserror::Error)]
pub enum SegmentsError {
    #[error("Unable to read segments file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unable to parse segments file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One entry of a segments file.
///
/// ```json
/// [{"text": "user: hi"}, {"random_embeddings": 4}, {"embeddings": [[0.1, 0.2]]}]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentSpec {
    Text(String),
    Embeddings(Vec<Vec<f32>>),
    /// Uniform `[0, 1)` vectors of the model's width.
    RandomEmbeddings(usize),
}

impl SegmentSpec {
    pub fn build(
        self,
        embedding_width: usize,
        rng: &mut StdRng,
    ) -> Segment {
        match self {
            SegmentSpec::Text(text) => Segment::Text(text),
            SegmentSpec::Embeddings(vectors) => {
                Segment::Embeddings(EmbeddingBatch::new(vectors))
            },
            SegmentSpec::RandomEmbeddings(count) => Segment::Embeddings(
                random_embeddings(count, embedding_width, rng),
            ),
        }
    }
}

pub fn load_segments(path: &Path) -> Result<Vec<SegmentSpec>, SegmentsError> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Question, random stimulus, answer prefix and an optional user prompt.
pub fn default_segments(
    embeddings_count: usize,
    prompt: Option<String>,
) -> Vec<SegmentSpec> {
    let mut segments = vec![SegmentSpec::Text(String::from(QUESTION))];
    if embeddings_count > 0 {
        segments.push(SegmentSpec::RandomEmbeddings(embeddings_count));
    }
    segments.push(SegmentSpec::Text(String::from(ANSWER_PREFIX)));
    if let Some(prompt) = prompt.filter(|prompt| !prompt.is_empty()) {
        segments.push(SegmentSpec::Text(prompt));
    }
    segments
}

pub fn random_embeddings(
    count: usize,
    width: usize,
    rng: &mut StdRng,
) -> EmbeddingBatch {
    let data: Vec<f32> =
        (0..count * width).map(|_| rng.random::<f32>()).collect();
    EmbeddingBatch::from_flat(&data, width)
}
