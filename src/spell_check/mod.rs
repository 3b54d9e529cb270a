pub mod onnx;
pub mod typo_detector;

pub use typo_detector::{Detection, DetectorOptions, TypoDetector, TypoSpan};
