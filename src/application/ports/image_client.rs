use async_trait::async_trait;

/// Request for one generated image. Reference image paths are passed through
/// to the backing model in order: location first, then characters, then
/// props, then the prior frame.
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub prompt: String,
    pub model: String,
    pub references: Vec<String>,
}

#[async_trait]
pub trait ImageClient: Send + Sync {
    async fn generate(&self, request: &ImageRequest) -> Result<Vec<u8>, ImageClientError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ImageClientError {
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
    #[error("rate limited")]
    RateLimited,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
