use std::time::Duration;

use async_trait::async_trait;

use crate::application::ports::{LlmClient, LlmClientError};

/// Scaffold-mode client: deterministic canned text derived from the prompt,
/// with an optional delay so item loops behave like real generation.
pub struct MockLlmClient {
    response_delay: Duration,
}

impl MockLlmClient {
    pub fn new(response_delay_ms: u64) -> Self {
        Self {
            response_delay: Duration::from_millis(response_delay_ms),
        }
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, prompt: &str, _system: &str) -> Result<String, LlmClientError> {
        if !self.response_delay.is_zero() {
            tokio::time::sleep(self.response_delay).await;
        }
        let head: String = prompt.chars().take(40).collect();
        Ok(format!("Mock completion for: {}", head))
    }
}
