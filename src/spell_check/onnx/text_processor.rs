use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use super::array_utils::EncodedInput;
use super::errors::DetectionError;

/// Sub-word tokenization consumed by the typo detector.
///
/// `tokenize` returns the word-piece strings without sentinel tokens, while
/// `encode` produces the numeric model input with the sequence-start and
/// sequence-end sentinels included. Continuation pieces must be marked with a
/// fixed prefix (`##` for WordPiece vocabularies).
#[cfg_attr(test, mockall::automock)]
pub trait SubwordTokenizer {
    fn tokenize(&self, sentence: &str) -> Result<Vec<String>, DetectionError>;

    fn encode(&self, sentence: &str) -> Result<EncodedInput, DetectionError>;
}

/// `tokenizers`-backed WordPiece tokenizer loaded from a `tokenizer.json`
#[derive(Debug, Clone)]
pub struct HfTokenizer {
    tokenizer: Tokenizer,
}

impl HfTokenizer {
    fn wrap(mut tokenizer: Tokenizer) -> Self {
        // Fixed-length padding would desynchronise encode() from tokenize()
        tokenizer.with_padding(None);
        Self { tokenizer }
    }

    /// Load a tokenizer from an explicit `tokenizer.json` path
    pub fn from_file(path: &Path) -> Result<Self, DetectionError> {
        if !path.exists() {
            return Err(DetectionError::ModelNotFound {
                path: path.display().to_string(),
            });
        }

        info!("🔤 Loading tokenizer from: {}", path.display());
        let tokenizer = Tokenizer::from_file(path).map_err(|e| DetectionError::TokenizationFailed {
            details: format!("failed to load {}: {}", path.display(), e),
        })?;
        info!("✅ Tokenizer loaded successfully!");
        Ok(Self::wrap(tokenizer))
    }

    /// Find `tokenizer.json` next to the exported model
    pub fn from_model_dir(model_dir: &Path) -> Result<Self, DetectionError> {
        let candidates: [PathBuf; 2] = [
            model_dir.join("tokenizer.json"),
            model_dir.parent().unwrap_or(model_dir).join("tokenizer.json"),
        ];

        for candidate in &candidates {
            if candidate.exists() {
                match Self::from_file(candidate) {
                    Ok(tokenizer) => return Ok(tokenizer),
                    Err(e) => {
                        warn!("⚠️ Failed to load tokenizer from {}: {}", candidate.display(), e);
                        continue;
                    }
                }
            }
        }

        Err(DetectionError::ModelNotFound {
            path: candidates[0].display().to_string(),
        })
    }

    /// Build a tokenizer from its serialized JSON form
    pub fn from_json(json: &str) -> Result<Self, DetectionError> {
        let tokenizer = Tokenizer::from_str(json).map_err(|e| DetectionError::TokenizationFailed {
            details: e.to_string(),
        })?;
        Ok(Self::wrap(tokenizer))
    }
}

impl SubwordTokenizer for HfTokenizer {
    fn tokenize(&self, sentence: &str) -> Result<Vec<String>, DetectionError> {
        let encoding = self
            .tokenizer
            .encode(sentence, false)
            .map_err(|e| DetectionError::TokenizationFailed { details: e.to_string() })?;
        let tokens = encoding.get_tokens().to_vec();
        debug!("📝 Tokenized '{}' into {:?}", sentence, tokens);
        Ok(tokens)
    }

    fn encode(&self, sentence: &str) -> Result<EncodedInput, DetectionError> {
        let encoding = self
            .tokenizer
            .encode(sentence, true)
            .map_err(|e| DetectionError::TokenizationFailed { details: e.to_string() })?;

        let widen = |values: &[u32]| values.iter().map(|&v| i64::from(v)).collect::<Vec<i64>>();
        Ok(EncodedInput {
            input_ids: widen(encoding.get_ids()),
            attention_mask: widen(encoding.get_attention_mask()),
            token_type_ids: widen(encoding.get_type_ids()),
        })
    }
}
