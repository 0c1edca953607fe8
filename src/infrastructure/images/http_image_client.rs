use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::ports::{ImageClient, ImageClientError, ImageRequest};
use crate::infrastructure::observability::sanitize_prompt;

/// Image generation over an OpenAI-compatible images endpoint returning
/// base64 payloads. Reference paths are forwarded for models that accept
/// them.
pub struct HttpImageClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct GenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    references: &'a [String],
    response_format: &'static str,
}

#[derive(Deserialize)]
struct GenerationResponse {
    data: Vec<GenerationData>,
}

#[derive(Deserialize)]
struct GenerationData {
    b64_json: String,
}

impl HttpImageClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl ImageClient for HttpImageClient {
    async fn generate(&self, request: &ImageRequest) -> Result<Vec<u8>, ImageClientError> {
        tracing::debug!(
            model = %request.model,
            references = request.references.len(),
            prompt = %sanitize_prompt(&request.prompt),
            "Image request"
        );

        let request_body = GenerationRequest {
            model: &request.model,
            prompt: &request.prompt,
            references: &request.references,
            response_format: "b64_json",
        };

        let response = self
            .client
            .post(format!("{}/images/generations", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request_body)
            .send()
            .await
            .map_err(|e| ImageClientError::ApiRequestFailed(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ImageClientError::RateLimited);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ImageClientError::ApiRequestFailed(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let generation: GenerationResponse = response
            .json()
            .await
            .map_err(|e| ImageClientError::InvalidResponse(e.to_string()))?;

        let first = generation
            .data
            .into_iter()
            .next()
            .ok_or_else(|| ImageClientError::InvalidResponse("empty data".to_string()))?;

        general_purpose::STANDARD
            .decode(&first.b64_json)
            .map_err(|e| ImageClientError::InvalidResponse(e.to_string()))
    }
}
