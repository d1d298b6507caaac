use tokenizers::Tokenizer;

use super::{ModelError, TokenId};

/// Converts text into vocabulary ids. Holds no state beyond the vocabulary.
pub trait SegmentEncoder {
    fn tokenize(
        &self,
        text: &str,
    ) -> Result<Vec<TokenId>, ModelError>;
}

pub trait TokenDecoder {
    fn decode_token(
        &self,
        token_id: TokenId,
    ) -> Result<String, ModelError>;
}

impl SegmentEncoder for Tokenizer {
    fn tokenize(
        &self,
        text: &str,
    ) -> Result<Vec<TokenId>, ModelError> {
        let encoding = self
            .encode(text, false)
            .map_err(|err| ModelError::Tokenization(err.to_string()))?;
        Ok(encoding.get_ids().to_vec())
    }
}

impl TokenDecoder for Tokenizer {
    fn decode_token(
        &self,
        token_id: TokenId,
    ) -> Result<String, ModelError> {
        self.decode(&[token_id], false)
            .map_err(|err| ModelError::Decoding(err.to_string()))
    }
}
