//! Gemini backend for the text-generation port.

use super::{GenerationError, GenerationRequest, MinIntervalLimiter, TextGenerator};
use ::gemini::{Gemini, Request, Response};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Spacing between calls that keeps a free-tier key under its quota.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(12);

pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2048;

/// A [`TextGenerator`] backed by the Gemini API.
pub struct GeminiGenerator {
    client: Gemini,
    limiter: MinIntervalLimiter,
    max_output_tokens: u32,
}

impl GeminiGenerator {
    pub fn new(client: Gemini) -> Self {
        Self {
            client,
            limiter: MinIntervalLimiter::new(DEFAULT_MIN_INTERVAL),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }

    /// Create a generator from the GEMINI_API_KEY environment variable.
    pub fn from_env() -> Result<Self, GenerationError> {
        Ok(Self::new(Gemini::from_env()?))
    }

    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.limiter = MinIntervalLimiter::new(interval);
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        request.validate()?;
        self.limiter.acquire().await;

        let api_request = Request::prompt(request.effective_prompt())
            .with_temperature(request.temperature)
            .with_max_output_tokens(self.max_output_tokens);

        let response = self.client.generate(api_request).await?;
        debug!(
            model = self.client.model(),
            prompt_tokens = response.usage.prompt_tokens,
            output_tokens = response.usage.candidates_tokens,
            "Gemini call finished"
        );
        response_text(&response)
    }
}

/// Usable text of a response, or why there is none.
fn response_text(response: &Response) -> Result<String, GenerationError> {
    let text = response.text();
    let text = text.trim();
    if !text.is_empty() {
        return Ok(text.to_string());
    }
    match response.block_reason() {
        Some(reason) => Err(GenerationError::Blocked { reason }),
        None => Err(GenerationError::EmptyResponse),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::gemini::{Candidate, FinishReason, PromptFeedback, Usage};

    fn response(parts: &[&str], finish_reason: Option<FinishReason>) -> Response {
        Response {
            candidates: vec![Candidate {
                parts: parts.iter().map(|p| p.to_string()).collect(),
                finish_reason,
            }],
            prompt_feedback: None,
            usage: Usage::default(),
            model_version: None,
        }
    }

    #[test]
    fn test_text_is_joined_and_trimmed() {
        let r = response(&["  The monk ", "bowed.\n"], Some(FinishReason::Stop));
        assert_eq!(response_text(&r).unwrap(), "The monk bowed.");
    }

    #[test]
    fn test_policy_finish_reason_is_blocked() {
        let r = response(&[], Some(FinishReason::Safety));
        match response_text(&r) {
            Err(GenerationError::Blocked { reason }) => assert_eq!(reason, "SAFETY"),
            other => panic!("expected Blocked, got {:?}", other),
        }
    }

    #[test]
    fn test_prompt_block_reason_is_blocked() {
        let r = Response {
            candidates: vec![],
            prompt_feedback: Some(PromptFeedback {
                block_reason: Some("PROHIBITED_CONTENT".into()),
            }),
            usage: Usage::default(),
            model_version: None,
        };
        assert!(matches!(
            response_text(&r),
            Err(GenerationError::Blocked { .. })
        ));
    }

    #[test]
    fn test_empty_without_reason() {
        let r = response(&["   "], Some(FinishReason::MaxTokens));
        assert!(matches!(
            response_text(&r),
            Err(GenerationError::EmptyResponse)
        ));
    }

    #[tokio::test]
    async fn test_empty_prompt_rejected_before_network() {
        let generator = GeminiGenerator::new(Gemini::new("test-key"))
            .with_min_interval(Duration::ZERO);
        let err = generator
            .generate(GenerationRequest::new("", 0.7))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::InvalidRequest(_)));
    }
}
