//! Text-generation port.
//!
//! Everything that talks to a language model goes through [`TextGenerator`]:
//! the story writer and the state extractor both send a prompt and get text
//! back. Backends live behind the trait so sessions can run against Gemini
//! or against a scripted generator in tests.

mod gemini;
mod rate_limit;
mod retry;

pub use self::gemini::{GeminiGenerator, DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_MIN_INTERVAL};
pub use rate_limit::MinIntervalLimiter;
pub use retry::{RetryConfig, RetryingGenerator};

use async_trait::async_trait;
use thiserror::Error;

/// Errors from a text generator.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Model returned no usable text")]
    EmptyResponse,

    #[error("Content blocked by the model: {reason}")]
    Blocked { reason: String },

    #[error("Invalid generation request: {0}")]
    InvalidRequest(String),

    #[error("Gemini API error: {0}")]
    Backend(#[from] ::gemini::Error),
}

impl GenerationError {
    /// Whether retrying the same request could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            GenerationError::Backend(e) => e.is_transient(),
            _ => false,
        }
    }
}

/// A single generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub temperature: f32,
    /// Stable context placed before the prompt.
    pub cached_prefix: Option<String>,
}

impl GenerationRequest {
    /// Create a request, clamping the temperature to `[0, 1]`.
    pub fn new(prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: clamp_temperature(temperature),
            cached_prefix: None,
        }
    }

    /// Attach a cached prefix.
    pub fn with_cached_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.cached_prefix = Some(prefix.into());
        self
    }

    /// The text actually sent to the model.
    pub fn effective_prompt(&self) -> String {
        match &self.cached_prefix {
            Some(prefix) => format!("{}\n\n{}", prefix, self.prompt),
            None => self.prompt.clone(),
        }
    }

    /// Reject requests no backend can serve.
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.prompt.trim().is_empty() {
            return Err(GenerationError::InvalidRequest(
                "prompt must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn clamp_temperature(temperature: f32) -> f32 {
    if temperature.is_nan() {
        return 0.0;
    }
    temperature.clamp(0.0, 1.0)
}

/// Something that turns a prompt into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a non-empty, trimmed continuation for `request`.
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError>;
}
