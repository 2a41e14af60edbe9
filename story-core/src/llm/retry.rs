//! Retry decorator for transient backend failures.

use super::{GenerationError, GenerationRequest, TextGenerator};
use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

/// Backoff settings for [`RetryingGenerator`].
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Fraction of the delay added or removed at random.
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            jitter: 0.2,
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (0-based), without jitter.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        let ms = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        Duration::from_millis(ms)
    }

    fn jittered_delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt).as_millis() as f64;
        let jitter = self.jitter.clamp(0.0, 1.0);
        let factor = if jitter > 0.0 {
            1.0 + rand::thread_rng().gen_range(-jitter..=jitter)
        } else {
            1.0
        };
        Duration::from_millis((base * factor).max(0.0) as u64)
    }
}

/// Wraps a generator and retries transient backend errors.
///
/// Blocked and empty responses are returned as-is.
pub struct RetryingGenerator {
    inner: Arc<dyn TextGenerator>,
    config: RetryConfig,
}

impl RetryingGenerator {
    pub fn new(inner: Arc<dyn TextGenerator>) -> Self {
        Self {
            inner,
            config: RetryConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RetryConfig) -> Self {
        self.config = config;
        self
    }
}

#[async_trait]
impl TextGenerator for RetryingGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        let mut attempt = 0;
        loop {
            match self.inner.generate(request.clone()).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    let delay = self.config.jittered_delay(attempt);
                    warn!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient generation failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_transient() {
                        error!(attempts = attempt + 1, error = %e, "Retries exhausted");
                    }
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedGenerator;

    fn network_error() -> GenerationError {
        GenerationError::Backend(::gemini::Error::Network("connection reset".into()))
    }

    #[test]
    fn test_backoff_is_capped() {
        let config = RetryConfig::default();
        assert_eq!(config.base_delay(0), Duration::from_millis(1000));
        assert_eq!(config.base_delay(2), Duration::from_millis(4000));
        assert_eq!(config.base_delay(10), Duration::from_millis(30_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_then_succeeds() {
        let scripted = Arc::new(ScriptedGenerator::new(vec![
            Err(network_error()),
            Ok("The river froze.".to_string()),
        ]));
        let generator = RetryingGenerator::new(scripted.clone());

        let text = generator
            .generate(GenerationRequest::new("Continue", 0.7))
            .await
            .unwrap();
        assert_eq!(text, "The river froze.");
        assert_eq!(scripted.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocked_is_not_retried() {
        let scripted = Arc::new(ScriptedGenerator::new(vec![
            Err(GenerationError::Blocked {
                reason: "SAFETY".into(),
            }),
            Ok("never reached".to_string()),
        ]));
        let generator = RetryingGenerator::new(scripted.clone());

        let err = generator
            .generate(GenerationRequest::new("Continue", 0.7))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Blocked { .. }));
        assert_eq!(scripted.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let scripted = Arc::new(ScriptedGenerator::new(vec![
            Err(network_error()),
            Err(network_error()),
            Err(network_error()),
        ]));
        let generator = RetryingGenerator::new(scripted.clone()).with_config(RetryConfig {
            max_retries: 2,
            ..RetryConfig::default()
        });

        let err = generator
            .generate(GenerationRequest::new("Continue", 0.7))
            .await
            .unwrap_err();
        assert!(err.is_transient());
        assert_eq!(scripted.call_count(), 3);
    }
}
