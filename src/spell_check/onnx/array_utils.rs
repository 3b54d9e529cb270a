use tract_onnx::prelude::*;
use tract_onnx::prelude::tract_ndarray::{s, Array2, Array3, ArrayView1};

use super::errors::DetectionError;

/// Encoded model input for a single sentence, sentinel tokens included
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedInput {
    pub input_ids: Vec<i64>,
    pub attention_mask: Vec<i64>,
    pub token_type_ids: Vec<i64>,
}

impl EncodedInput {
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }

    /// Right-pad every row to `target` positions with zeros (pad id, masked out)
    pub fn padded_to(&self, target: usize) -> Result<Self, DetectionError> {
        if self.len() > target {
            return Err(DetectionError::TensorCreationFailed {
                details: format!(
                    "sequence of {} tokens exceeds the static shape of {}",
                    self.len(),
                    target
                ),
            });
        }

        let pad = |row: &[i64]| {
            let mut padded = row.to_vec();
            padded.resize(target, 0);
            padded
        };

        Ok(Self {
            input_ids: pad(&self.input_ids),
            attention_mask: pad(&self.attention_mask),
            token_type_ids: pad(&self.token_type_ids),
        })
    }

    /// Pick the row matching an ONNX input name (`input_ids`, `attention_mask`, `token_type_ids`)
    pub fn row_for(&self, input_name: &str) -> &[i64] {
        let name = input_name.to_ascii_lowercase();
        if name.contains("mask") {
            &self.attention_mask
        } else if name.contains("type") {
            &self.token_type_ids
        } else {
            &self.input_ids
        }
    }
}

/// What the values along the label axis are
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreKind {
    /// Raw model outputs, normalised with softmax on read
    Logits,
    /// Already a distribution over labels, read as-is
    Probabilities,
}

/// Per-token class scores shaped `[1, seq_len, labels]`
#[derive(Debug, Clone, PartialEq)]
pub struct TokenScores {
    data: Array3<f32>,
    kind: ScoreKind,
}

impl TokenScores {
    pub fn new(data: Array3<f32>, kind: ScoreKind) -> Result<Self, DetectionError> {
        let shape = data.shape().to_vec();
        if shape[0] != 1 {
            return Err(DetectionError::ShapeMismatch {
                shape,
                details: "expected a batch of exactly one sentence".to_string(),
            });
        }
        Ok(Self { data, kind })
    }

    /// Build scores from one row of label scores per position
    pub fn from_rows(rows: &[Vec<f32>], kind: ScoreKind) -> Result<Self, DetectionError> {
        let labels = rows.first().map(Vec::len).unwrap_or(0);
        if rows.iter().any(|row| row.len() != labels) {
            return Err(DetectionError::ShapeMismatch {
                shape: vec![1, rows.len(), labels],
                details: "rows have differing label counts".to_string(),
            });
        }

        let flat: Vec<f32> = rows.iter().flatten().copied().collect();
        let data = Array3::from_shape_vec((1, rows.len(), labels), flat).map_err(|e| {
            DetectionError::ShapeMismatch {
                shape: vec![1, rows.len(), labels],
                details: e.to_string(),
            }
        })?;
        Self::new(data, kind)
    }

    /// Read the first model output as `[1, seq_len, labels]` f32 logits
    pub fn from_tensor(tensor: &Tensor) -> Result<Self, DetectionError> {
        let shape = tensor.shape().to_vec();
        let view = tensor
            .to_array_view::<f32>()
            .map_err(|e| DetectionError::ShapeMismatch {
                shape: shape.clone(),
                details: e.to_string(),
            })?;
        let data = view
            .into_dimensionality::<tract_ndarray::Ix3>()
            .map_err(|e| DetectionError::ShapeMismatch {
                shape,
                details: e.to_string(),
            })?
            .to_owned();
        Self::new(data, ScoreKind::Logits)
    }

    /// Number of scored positions, sentinels included
    pub fn positions(&self) -> usize {
        self.data.shape()[1]
    }

    pub fn labels(&self) -> usize {
        self.data.shape()[2]
    }

    /// Keep only the first `len` positions (drops padding added for static shapes)
    pub fn truncated(&self, len: usize) -> Self {
        let len = len.min(self.positions());
        Self {
            data: self.data.slice(s![.., ..len, ..]).to_owned(),
            kind: self.kind,
        }
    }

    fn row(&self, position: usize) -> ArrayView1<'_, f32> {
        self.data.slice(s![0, position, ..])
    }

    /// Highest-scoring label at a position; ties resolve to the lower label
    pub fn argmax(&self, position: usize) -> usize {
        let mut best = 0;
        let mut best_score = f32::NEG_INFINITY;
        for (label, &score) in self.row(position).iter().enumerate() {
            if score > best_score {
                best = label;
                best_score = score;
            }
        }
        best
    }

    /// Probability of `label` at a position; logits go through softmax first
    pub fn probability(&self, position: usize, label: usize) -> f32 {
        let row = self.row(position);
        if label >= row.len() {
            return 0.0;
        }
        if self.kind == ScoreKind::Probabilities {
            return row[label];
        }

        let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let total: f32 = row.iter().map(|&score| (score - max).exp()).sum();
        if total == 0.0 {
            return 0.0;
        }
        (row[label] - max).exp() / total
    }
}

/// Build a `[1, len]` i64 tensor for one model input
pub fn create_input_tensor(values: &[i64]) -> Result<Tensor, DetectionError> {
    let array = Array2::from_shape_vec((1, values.len()), values.to_vec()).map_err(|e| {
        DetectionError::TensorCreationFailed {
            details: e.to_string(),
        }
    })?;
    Ok(array.into())
}
