use serde::{Deserialize, Serialize};

use crate::{model::TokenId, session::types::Stats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FinishReason {
    Stop,
    Length,
    Cancelled,
    Failed,
}

/// A sampled token and its decoded text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Fragment {
    pub index: usize,
    pub token: TokenId,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct Output {
    pub text: String,
    pub tokens: Vec<TokenId>,
    pub stats: Stats,
    pub finish_reason: Option<FinishReason>,
}
