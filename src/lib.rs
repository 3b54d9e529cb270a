//! Typo detection with a pretrained token-classification model.
//!
//! A sentence is split into sub-word tokens, scored per token by an ONNX
//! classifier (label 1 = typo), and the flagged tokens are folded back onto
//! whole words so the sentence can be returned with each misspelled word
//! wrapped in markers.

pub mod config;
pub mod error;
pub mod spell_check;

pub use config::Config;
pub use error::{AppError, Result};
pub use spell_check::onnx::{
    AnnotationStrategy, DetectionError, HfTokenizer, InferenceMode, Markers, OnnxModelManager,
    SubwordTokenizer, TokenClassifier,
};
pub use spell_check::{Detection, DetectorOptions, TypoDetector, TypoSpan};

/// Detector over the bundled tokenizer and ONNX runtime adapters
pub type OnnxTypoDetector = TypoDetector<HfTokenizer, OnnxModelManager>;

/// Load the tokenizer and model named by `config` and assemble a detector
pub fn load_detector(config: &Config) -> Result<OnnxTypoDetector> {
    let tokenizer = HfTokenizer::from_model_dir(&config.model_dir)?;
    let classifier = OnnxModelManager::load(
        &config.model_dir,
        config.inference_mode,
        config.max_sequence_length,
        config.ir_cache_dir.as_deref(),
    )?;
    Ok(TypoDetector::new(tokenizer, classifier, config.detector_options()))
}
