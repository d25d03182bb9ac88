use thiserror::Error;

/// Failures of a single `/analyze` request
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("No file uploaded")]
    MissingUpload,

    #[error("Invalid file")]
    EmptyUpload,

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    #[error("Model call failed: {0}")]
    ModelCall(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AnalysisError {
    /// Client-input errors are reported with 400; the rest are server failures.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AnalysisError::MissingUpload | AnalysisError::EmptyUpload | AnalysisError::InvalidImage(_)
        )
    }
}

impl From<reqwest::Error> for AnalysisError {
    fn from(e: reqwest::Error) -> Self {
        AnalysisError::ModelCall(e.to_string())
    }
}

/// Why a model reply could not be turned into a nutrition mapping
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("No nutritional data found. Please try another image or check the API response.")]
    NoJsonFound,

    #[error("Failed to parse nutritional data: {0}")]
    JsonParse(#[from] serde_json::Error),
}
