//! ONNX token-classification typo detection modules
//!
//! This module splits the pipeline into separate concerns:
//!
//! - `errors`: Structured error types for detection
//! - `model_manager`: ONNX model loading, IR conversion and inference
//! - `text_processor`: Sub-word tokenization
//! - `array_utils`: Input tensors and per-token score handling
//! - `word_map`: Token position to word index mapping
//! - `typo_index`: Extraction of flagged word indexes from scores
//! - `text_utils`: Sentence splitting and annotation

pub mod errors;
pub mod model_manager;
pub mod text_processor;
pub mod array_utils;
pub mod word_map;
pub mod typo_index;
pub mod text_utils;

// Re-export commonly used types for convenience
pub use errors::DetectionError;
pub use model_manager::{InferenceMode, OnnxModelManager, TokenClassifier};
pub use text_processor::{HfTokenizer, SubwordTokenizer};
pub use array_utils::{EncodedInput, ScoreKind, TokenScores};
pub use word_map::WordIndexMap;
pub use typo_index::TypoIndexSet;
pub use text_utils::{AnnotationStrategy, Markers, WordList};
