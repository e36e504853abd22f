use crate::types::PredictionResult;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Usage: predict <model_path> <encoder_path>")]
    Usage,

    #[error("Error loading model: {0}")]
    ModelLoad(String),

    #[error("Error loading encoders: {0}")]
    EncoderLoad(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Model inference error: {0}")]
    ModelInference(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// The uniform failure shape every error path converges on.
    pub fn into_result(self) -> PredictionResult {
        tracing::debug!(error = ?self, "prediction failed");
        PredictionResult::failure(self.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

// Helper function for creating validation errors
pub fn validation_error(msg: &str) -> AppError {
    AppError::InvalidInput(msg.to_string())
}

// Helper function for creating inference errors
pub fn inference_error(msg: impl Into<String>) -> AppError {
    AppError::ModelInference(msg.into())
}
