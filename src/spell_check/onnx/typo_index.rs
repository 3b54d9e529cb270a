use tracing::debug;

use super::array_utils::TokenScores;
use super::errors::DetectionError;
use super::word_map::WordIndexMap;

/// Label the classifier assigns to misspelled tokens
pub const TYPO_LABEL: usize = 1;

/// Sequence-start and sequence-end positions wrapped around the tokens
const SENTINEL_POSITIONS: usize = 2;

/// Distinct flagged word indexes in first-seen order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypoIndexSet {
    indexes: Vec<usize>,
    // (sum of typo probabilities, flagged token count) per entry in `indexes`
    evidence: Vec<(f32, usize)>,
}

impl TypoIndexSet {
    /// Walk the scored positions in lockstep with the mapped tokens and collect
    /// the word index of every token whose argmax is `typo_label`.
    pub fn extract(
        scores: &TokenScores,
        word_map: &WordIndexMap,
        typo_label: usize,
    ) -> Result<Self, DetectionError> {
        let tokens = word_map.len();
        let positions = scores.positions();

        // An empty sentence may come back with or without its sentinels
        if tokens == 0 && positions <= SENTINEL_POSITIONS {
            return Ok(Self::default());
        }

        if positions != tokens + SENTINEL_POSITIONS {
            return Err(DetectionError::PositionMismatch { positions, tokens });
        }

        if typo_label >= scores.labels() {
            return Err(DetectionError::ShapeMismatch {
                shape: vec![1, positions, scores.labels()],
                details: format!("typo label {} is outside the label axis", typo_label),
            });
        }

        let mut set = Self::default();
        for (position, &word_index) in word_map.as_slice().iter().enumerate() {
            let scored = position + 1;
            if scores.argmax(scored) != typo_label {
                continue;
            }
            set.record(word_index, scores.probability(scored, typo_label));
        }

        debug!("🔎 Flagged word indexes: {:?}", set.indexes);
        Ok(set)
    }

    fn record(&mut self, word_index: usize, probability: f32) {
        match self.indexes.iter().position(|&index| index == word_index) {
            Some(slot) => {
                let (sum, count) = &mut self.evidence[slot];
                *sum += probability;
                *count += 1;
            }
            None => {
                self.indexes.push(word_index);
                self.evidence.push((probability, 1));
            }
        }
    }

    pub fn indexes(&self) -> &[usize] {
        &self.indexes
    }

    pub fn contains(&self, word_index: usize) -> bool {
        self.indexes.contains(&word_index)
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    /// Mean typo probability over the flagged sub-word tokens of a word
    pub fn confidence(&self, word_index: usize) -> Option<f32> {
        let slot = self.indexes.iter().position(|&index| index == word_index)?;
        let (sum, count) = self.evidence[slot];
        Some(sum / count as f32)
    }
}
