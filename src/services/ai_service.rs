use crate::error::AnalysisError;
use crate::services::preprocess::ImagePayload;

/// Trait for multimodal text generation backends (Gemini, test fakes, ...)
#[async_trait::async_trait]
pub trait VisionModel: Send + Sync {
    /// Generate free-form text from an instruction prompt and one image
    async fn generate(&self, prompt: &str, image: &ImagePayload) -> Result<String, AnalysisError>;
}
