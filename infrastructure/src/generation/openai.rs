//! OpenAI-compatible chat-completions gateway

use super::chat_format::{parse_response, request_body};
use async_trait::async_trait;
use interconsult_application::{GatewayError, GenerationGateway, GenerationRequest};
use interconsult_domain::GenerationResponse;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub base_url: String,
    pub api_key: String,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    pub request_timeout: Duration,
}

pub struct OpenAiGateway {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    max_tokens: u32,
    temperature: Option<f32>,
}

impl OpenAiGateway {
    pub fn new(settings: OpenAiSettings) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| GatewayError::Other(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/v1/chat/completions",
                settings.base_url.trim_end_matches('/').trim_end_matches("/v1")
            ),
            api_key: settings.api_key,
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        })
    }
}

#[async_trait]
impl GenerationGateway for OpenAiGateway {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, GatewayError> {
        let body = request_body(request, self.max_tokens, self.temperature);
        debug!(
            model = %request.model,
            messages = request.history.len(),
            tools = request.tools.len(),
            "Chat completion request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout
                } else {
                    GatewayError::Unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => GatewayError::RateLimited(detail),
                s if s.is_server_error() => GatewayError::Unavailable(format!("{}: {}", s, detail)),
                s => GatewayError::RequestFailed(format!("{}: {}", s, detail)),
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GatewayError::MalformedOutput(format!("invalid response body: {}", e)))?;
        parse_response(&json)
    }
}
