use ndarray::Array2;

use super::Error;

/// One piece of a prompt, consumed by a single evaluator call.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Text(String),
    Embeddings(EmbeddingBatch),
}

impl Segment {
    pub fn text(text: impl Into<String>) -> Self {
        Segment::Text(text.into())
    }

    pub fn embeddings(vectors: Vec<Vec<f32>>) -> Self {
        Segment::Embeddings(EmbeddingBatch::new(vectors))
    }
}

/// Ordered embedding vectors, one per input position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddingBatch {
    vectors: Vec<Vec<f32>>,
}

impl EmbeddingBatch {
    pub fn new(vectors: Vec<Vec<f32>>) -> Self {
        Self {
            vectors,
        }
    }

    /// Splits a contiguous buffer into vectors of `width` values. A trailing
    /// remainder becomes a short vector, which fails validation later.
    pub fn from_flat(
        data: &[f32],
        width: usize,
    ) -> Self {
        if width == 0 {
            return Self::default();
        }
        Self {
            vectors: data.chunks(width).map(|chunk| chunk.to_vec()).collect(),
        }
    }

    pub fn count(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    pub fn validate(
        &self,
        width: usize,
    ) -> Result<(), Error> {
        match self
            .vectors
            .iter()
            .position(|vector| vector.len() != width)
        {
            Some(index) => Err(Error::DimensionMismatch {
                index,
                expected: width,
                actual: self.vectors[index].len(),
            }),
            None => Ok(()),
        }
    }

    /// Validates the batch and packs it into a `[count, width]` matrix.
    pub fn to_array(
        &self,
        width: usize,
    ) -> Result<Array2<f32>, Error> {
        self.validate(width)?;
        let mut array = Array2::zeros((self.count(), width));
        for (mut row, vector) in array.rows_mut().into_iter().zip(&self.vectors)
        {
            row.iter_mut()
                .zip(vector)
                .for_each(|(target, value)| *target = *value);
        }
        Ok(array)
    }
}
