pub mod ai_service;
pub mod extractor;
pub mod gemini; // Google Gemini multimodal API
pub mod preprocess;

pub use ai_service::VisionModel;
pub use extractor::extract_json;
pub use gemini::GeminiService;
