use std::time::Duration;

use async_trait::async_trait;

use crate::application::ports::{ImageClient, ImageClientError, ImageRequest};

/// 1x1 transparent PNG, enough for the pipelines to write a real file.
const PLACEHOLDER_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x62, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Scaffold-mode image client with an optional per-request delay so
/// cancellation mid-loop is observable in local runs.
pub struct MockImageClient {
    response_delay: Duration,
}

impl MockImageClient {
    pub fn new(response_delay_ms: u64) -> Self {
        Self {
            response_delay: Duration::from_millis(response_delay_ms),
        }
    }
}

#[async_trait]
impl ImageClient for MockImageClient {
    async fn generate(&self, _request: &ImageRequest) -> Result<Vec<u8>, ImageClientError> {
        if !self.response_delay.is_zero() {
            tokio::time::sleep(self.response_delay).await;
        }
        Ok(PLACEHOLDER_PNG.to_vec())
    }
}
