use ndarray::{Array1, ArrayView2};

use super::{ModelError, TokenId};

/// A run of positions handed to the model in one evaluation call.
///
/// Both variants occupy one cache position per item, so the model cannot
/// tell an embedding row apart from the embedding of a looked up token.
#[derive(Debug, Clone, Copy)]
pub enum EvaluationItems<'a> {
    /// Token ids to be embedded by the model's own table.
    Tokens(&'a [TokenId]),
    /// Pre-computed embeddings. Shape: [positions, embedding_width]
    Embeddings(ArrayView2<'a, f32>),
}

impl<'a> EvaluationItems<'a> {
    pub fn len(&self) -> usize {
        match self {
            EvaluationItems::Tokens(tokens) => tokens.len(),
            EvaluationItems::Embeddings(rows) => rows.nrows(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle to a loaded model and its causal cache.
///
/// The cache is append-only: every call to [`ModelContext::evaluate`] must
/// start exactly where the previous one ended.
pub trait ModelContext {
    fn embedding_width(&self) -> usize;

    fn vocabulary_size(&self) -> usize;

    fn max_context_length(&self) -> usize;

    /// Appends `items` to the cache at `position_start` and returns the
    /// logits for the last appended position.
    fn evaluate(
        &mut self,
        position_start: usize,
        items: EvaluationItems<'_>,
    ) -> Result<Array1<f32>, ModelError>;

    fn decode(
        &self,
        token_id: TokenId,
    ) -> Result<String, ModelError>;

    fn bos_token(&self) -> Option<TokenId> {
        None
    }

    fn eos_tokens(&self) -> Vec<TokenId> {
        Vec::new()
    }

    /// Drops every cached position.
    fn reset(&mut self);
}
