use std::fmt;

use crate::spell_check::onnx::DetectionError;

#[derive(Debug)]
pub enum AppError {
    Detection(DetectionError),
    Config(String),
    IO(std::io::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Detection(err) => write!(f, "Detection error: {}", err),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::IO(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Detection(err) => Some(err),
            AppError::IO(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DetectionError> for AppError {
    fn from(err: DetectionError) -> Self {
        AppError::Detection(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IO(err)
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
