//! [`DecisionGateway`] over an Ollama server's chat endpoint.

use super::types::{
    ChatOptions, ChatRequest, ChatResponse, ErrorResponse, ListModelsResponse,
};
use async_trait::async_trait;
use polis_application::ports::decision_gateway::{DecisionGateway, GatewayError};
use polis_domain::Message;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, info};

/// Connection and sampling settings for [`OllamaDecisionGateway`].
#[derive(Debug, Clone, PartialEq)]
pub struct OllamaSettings {
    pub server_url: String,
    pub model: String,
    pub num_ctx: u32,
    pub temperature: Option<f32>,
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:5000".to_string(),
            model: "llama3.1:8b".to_string(),
            num_ctx: 100_000,
            temperature: None,
        }
    }
}

/// Decision gateway for a local Ollama server.
///
/// Every call asks for a JSON response constrained to the decision schema
/// and uses a fresh random seed.
pub struct OllamaDecisionGateway {
    client: Client,
    settings: OllamaSettings,
}

impl OllamaDecisionGateway {
    pub fn new(settings: OllamaSettings) -> Self {
        info!(
            "Ollama gateway for {} at {}",
            settings.model, settings.server_url
        );
        Self {
            client: Client::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &OllamaSettings {
        &self.settings
    }

    /// Whether the server lists the configured model.
    pub async fn check_model_available(&self) -> Result<bool, GatewayError> {
        let url = self.endpoint("api/tags");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| GatewayError::ConnectionError(format!("{}: {}", url, e)))?;

        if !response.status().is_success() {
            return Ok(false);
        }

        let list: ListModelsResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        Ok(list.models.iter().any(|m| m.name == self.settings.model))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.settings.server_url.trim_end_matches('/'), path)
    }

    pub(crate) fn build_request(
        &self,
        system_prompt: &str,
        history: &[Message],
        schema: &Value,
        seed: u32,
    ) -> ChatRequest {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(Message::system(system_prompt));
        messages.extend_from_slice(history);

        ChatRequest {
            model: self.settings.model.clone(),
            messages,
            stream: false,
            format: schema.clone(),
            options: ChatOptions {
                num_ctx: self.settings.num_ctx,
                seed,
                temperature: self.settings.temperature,
            },
        }
    }
}

#[async_trait]
impl DecisionGateway for OllamaDecisionGateway {
    async fn decide(
        &self,
        system_prompt: &str,
        history: &[Message],
        schema: &Value,
    ) -> Result<String, GatewayError> {
        let request = self.build_request(system_prompt, history, schema, rand::random());
        let url = self.endpoint("api/chat");
        debug!(
            "POST {} ({} messages, model {})",
            url,
            request.messages.len(),
            request.model
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout
                } else if e.is_connect() {
                    GatewayError::ConnectionError(format!("{}: {}", url, e))
                } else {
                    GatewayError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body, &self.settings.model));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        if !body.done {
            debug!("Ollama response for {} not marked done", self.settings.model);
        }
        Ok(body.message.content)
    }

    fn model_name(&self) -> &str {
        &self.settings.model
    }
}

fn status_error(status: StatusCode, body: &str, model: &str) -> GatewayError {
    let detail = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| body.trim().to_string());

    match status {
        StatusCode::NOT_FOUND => GatewayError::ModelNotAvailable(format!("{}: {}", model, detail)),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => GatewayError::Timeout,
        _ => GatewayError::RequestFailed(format!("HTTP {}: {}", status.as_u16(), detail)),
    }
}
