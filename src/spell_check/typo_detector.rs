use serde::Serialize;
use tracing::{debug, info};

use super::onnx::errors::DetectionError;
use super::onnx::model_manager::TokenClassifier;
use super::onnx::text_processor::SubwordTokenizer;
use super::onnx::text_utils::{self, AnnotationStrategy, Markers, WordList};
use super::onnx::typo_index::{TypoIndexSet, TYPO_LABEL};
use super::onnx::word_map::{WordIndexMap, CONTINUATION_PREFIX};

/// Settings that shape post-processing of the classifier output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectorOptions {
    pub continuation_prefix: String,
    pub typo_label: usize,
    pub markers: Markers,
    pub annotation: AnnotationStrategy,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            continuation_prefix: CONTINUATION_PREFIX.to_string(),
            typo_label: TYPO_LABEL,
            markers: Markers::default(),
            annotation: AnnotationStrategy::default(),
        }
    }
}

/// A flagged word of the sentence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypoSpan {
    pub word_index: usize,
    pub word: String,
    pub confidence: f32,
}

/// Full result of checking one sentence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub original: String,
    pub annotated: String,
    pub typos: Vec<TypoSpan>,
}

/// Token-classification typo detector over pluggable tokenizer and classifier
#[derive(Debug)]
pub struct TypoDetector<T, C> {
    tokenizer: T,
    classifier: C,
    options: DetectorOptions,
}

impl<T: SubwordTokenizer, C: TokenClassifier> TypoDetector<T, C> {
    pub fn new(tokenizer: T, classifier: C, options: DetectorOptions) -> Self {
        Self {
            tokenizer,
            classifier,
            options,
        }
    }

    /// Check a sentence and return it alongside its annotated copy
    pub fn detect(&self, sentence: &str) -> Result<(String, String), DetectionError> {
        let detection = self.analyze(sentence)?;
        Ok((detection.original, detection.annotated))
    }

    /// Check a sentence and report every flagged word
    pub fn analyze(&self, sentence: &str) -> Result<Detection, DetectionError> {
        info!("🔧 Checking sentence: '{}'", sentence);

        let tokens = self.tokenizer.tokenize(sentence)?;
        let word_map = WordIndexMap::build(&tokens, &self.options.continuation_prefix);
        debug!("📝 {} tokens across {} words", tokens.len(), word_map.word_count());

        let encoded = self.tokenizer.encode(sentence)?;
        let scores = self.classifier.classify(&encoded)?;
        let typos = TypoIndexSet::extract(&scores, &word_map, self.options.typo_label)?;

        let words = WordList::split(sentence);
        let flagged = text_utils::typo_words(&words, &typos);

        let annotated = match self.options.annotation {
            AnnotationStrategy::Positional => {
                text_utils::annotate_positional(sentence, &words, &typos, &self.options.markers)
            }
            AnnotationStrategy::Literal => {
                let literal: Vec<&str> = flagged.iter().map(|&(_, word)| word).collect();
                text_utils::annotate_literal(sentence, &literal, &self.options.markers)
            }
        };

        let typos: Vec<TypoSpan> = flagged
            .into_iter()
            .map(|(word_index, word)| TypoSpan {
                word_index,
                word: word.to_string(),
                confidence: typos.confidence(word_index).unwrap_or_default(),
            })
            .collect();

        info!("✅ Found {} typo(s): '{}'", typos.len(), annotated);
        Ok(Detection {
            original: sentence.to_string(),
            annotated,
            typos,
        })
    }
}
