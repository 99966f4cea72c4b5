pub mod error;
pub mod inference;

pub use error::{GenerationError, GenerationResult};
pub use inference::{extract_generated_text, HuggingFaceClient};

use std::time::Duration;

/// Token value shipped in sample `.env` files; treated as "not configured".
pub const PLACEHOLDER_TOKEN: &str = "YOUR_HUGGING_FACE_TOKEN";

const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co";
const DEFAULT_MODEL: &str = "microsoft/DialoGPT-medium";

/// Configuration for the text-generation inference API.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub token: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    pub max_length: u32,
    pub temperature: f64,
    pub top_p: f64,
}

impl GenerationConfig {
    /// Build a config only when `raw_token` is a usable credential.
    pub fn from_token(raw_token: Option<String>) -> Option<Self> {
        resolve_token(raw_token).map(|token| Self {
            token,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            max_length: 200,
            temperature: 0.9,
            top_p: 0.95,
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}/models/{}", self.base_url, self.model)
    }
}

/// Absent, blank and placeholder tokens all disable AI generation.
pub fn resolve_token(raw: Option<String>) -> Option<String> {
    raw.map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty() && t != PLACEHOLDER_TOKEN)
}
