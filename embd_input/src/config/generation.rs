use serde::{Deserialize, Serialize};

/// Sampling defaults shipped with a model.
#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Clone)]
pub struct GenerationConfig {
    #[serde(default)]
    pub stop_token_ids: Vec<u32>,
    pub temperature: Option<f32>,
    pub top_k: Option<u32>,
    pub top_p: Option<f32>,
    pub min_p: Option<f32>,
    pub repetition_penalty: Option<f32>,
    pub presence_penalty: Option<f32>,
    pub frequency_penalty: Option<f32>,
    pub repeat_last_n: Option<usize>,
}
