#![allow(dead_code)]
use std::{cell::RefCell, rc::Rc};

use embd_input::{
    EvaluationItems, ModelContext, ModelError, SegmentEncoder, TokenId,
    session::{
        Session,
        config::DecodingConfig,
        parameter::{ContextLength, PrefillStepSize, SamplingSeed},
    },
};
use ndarray::Array1;
use rand::{Rng, SeedableRng, rngs::StdRng};

pub const VOCABULARY_SIZE: usize = 130;
pub const EMBEDDING_WIDTH: usize = 8;
pub const MAX_CONTEXT_LENGTH: usize = 256;
pub const BOS_TOKEN: TokenId = 128;
pub const EOS_TOKEN: TokenId = 129;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Tokens,
    Embeddings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Call {
    pub position_start: usize,
    pub count: usize,
    pub kind: CallKind,
}

/// Model double that records every evaluation and produces one-hot logits.
///
/// The favoured token is a lowercase letter picked from the end position of
/// the call, or the EOS token when the end position equals `eos_at`.
pub struct RecordingModel {
    pub calls: Rc<RefCell<Vec<Call>>>,
    pub eos_at: Option<usize>,
    pub fail_at: Option<usize>,
    cached: usize,
}

impl RecordingModel {
    pub fn new() -> Self {
        Self {
            calls: Rc::new(RefCell::new(Vec::new())),
            eos_at: None,
            fail_at: None,
            cached: 0,
        }
    }

    pub fn with_eos_at(
        mut self,
        position: usize,
    ) -> Self {
        self.eos_at = Some(position);
        self
    }

    pub fn with_fail_at(
        mut self,
        position: usize,
    ) -> Self {
        self.fail_at = Some(position);
        self
    }
}

impl ModelContext for RecordingModel {
    fn embedding_width(&self) -> usize {
        EMBEDDING_WIDTH
    }

    fn vocabulary_size(&self) -> usize {
        VOCABULARY_SIZE
    }

    fn max_context_length(&self) -> usize {
        MAX_CONTEXT_LENGTH
    }

    fn evaluate(
        &mut self,
        position_start: usize,
        items: EvaluationItems<'_>,
    ) -> Result<Array1<f32>, ModelError> {
        if position_start != self.cached {
            return Err(ModelError::PositionMismatch {
                expected: self.cached,
                actual: position_start,
            });
        }
        if self.fail_at == Some(position_start) {
            return Err(ModelError::Evaluation(String::from("injected")));
        }
        let count = items.len();
        if position_start + count > MAX_CONTEXT_LENGTH {
            return Err(ModelError::Capacity);
        }
        let kind = match items {
            EvaluationItems::Tokens(_) => CallKind::Tokens,
            EvaluationItems::Embeddings(rows) => {
                assert_eq!(rows.ncols(), EMBEDDING_WIDTH);
                CallKind::Embeddings
            },
        };
        self.calls.borrow_mut().push(Call {
            position_start,
            count,
            kind,
        });
        self.cached += count;

        let favoured = if self.eos_at == Some(self.cached) {
            EOS_TOKEN as usize
        } else {
            'a' as usize + self.cached % 26
        };
        let mut logits = Array1::zeros(VOCABULARY_SIZE);
        logits[favoured] = 5.0;
        Ok(logits)
    }

    fn decode(
        &self,
        token_id: TokenId,
    ) -> Result<String, ModelError> {
        decode_char(token_id)
    }

    fn bos_token(&self) -> Option<TokenId> {
        Some(BOS_TOKEN)
    }

    fn eos_tokens(&self) -> Vec<TokenId> {
        vec![EOS_TOKEN]
    }

    fn reset(&mut self) {
        self.cached = 0;
        self.calls.borrow_mut().clear();
    }
}

/// One token per ASCII character.
pub struct CharEncoder;

impl SegmentEncoder for CharEncoder {
    fn tokenize(
        &self,
        text: &str,
    ) -> Result<Vec<TokenId>, ModelError> {
        text.chars()
            .map(|character| {
                if character.is_ascii() {
                    Ok(character as TokenId)
                } else {
                    Err(ModelError::Tokenization(format!(
                        "non ascii character {:?}",
                        character
                    )))
                }
            })
            .collect()
    }
}

pub fn decode_char(token_id: TokenId) -> Result<String, ModelError> {
    match token_id {
        BOS_TOKEN => Ok(String::from("<s>")),
        EOS_TOKEN => Ok(String::from("</s>")),
        id if id < 128 => Ok(char::from(id as u8).to_string()),
        id => Err(ModelError::Decoding(format!("unknown token {}", id))),
    }
}

pub fn build_decoding_config(
    add_bos_token: bool,
    prefill_step_size: PrefillStepSize,
) -> DecodingConfig {
    DecodingConfig::new(
        ContextLength::Maximal,
        prefill_step_size,
        SamplingSeed::Custom(42),
        add_bos_token,
    )
}

pub fn build_session(model: RecordingModel) -> Session {
    Session::new(
        Box::new(model),
        Box::new(CharEncoder),
        build_decoding_config(false, PrefillStepSize::Default),
    )
}

/// Returns the session together with the model's call log.
pub fn build_recorded_session(
    model: RecordingModel,
    decoding_config: DecodingConfig,
) -> (Session, Rc<RefCell<Vec<Call>>>) {
    let calls = model.calls.clone();
    let session =
        Session::new(Box::new(model), Box::new(CharEncoder), decoding_config);
    (session, calls)
}

pub fn random_embeddings(
    count: usize,
    width: usize,
    seed: u64,
) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| (0..width).map(|_| rng.random::<f32>()).collect())
        .collect()
}

/// Session whose context holds at most `capacity` positions.
pub fn build_bounded_session(
    model: RecordingModel,
    capacity: usize,
) -> Session {
    Session::new(
        Box::new(model),
        Box::new(CharEncoder),
        DecodingConfig::new(
            ContextLength::Custom(capacity),
            PrefillStepSize::Default,
            SamplingSeed::Custom(42),
            false,
        ),
    )
}
