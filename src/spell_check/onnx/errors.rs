/// Errors that can occur while detecting typos with an ONNX token classifier
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("Model file not found: {path}")]
    ModelNotFound { path: String },

    #[error("Failed to load ONNX model from {path}: {details}")]
    ModelLoadFailed { path: String, details: String },

    #[error("Failed to convert {path} to the intermediate representation: {details}")]
    ConversionFailed { path: String, details: String },

    #[error("Tokenization failed: {details}")]
    TokenizationFailed { details: String },

    #[error("Failed to build input tensor: {details}")]
    TensorCreationFailed { details: String },

    #[error("Inference failed: {details}")]
    InferenceFailed { details: String },

    #[error("Classifier returned {positions} scored positions for {tokens} tokens (plus 2 sentinels)")]
    PositionMismatch { positions: usize, tokens: usize },

    #[error("Unexpected score shape {shape:?}: {details}")]
    ShapeMismatch { shape: Vec<usize>, details: String },

    #[error("IO error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}
