//! Decision gateway port
//!
//! Defines the interface for asking a language model for an agent's next
//! decision.

use async_trait::async_trait;
use polis_domain::Message;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur during decision gateway operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

/// Gateway for decision calls
///
/// This port defines how the application layer asks a model for a
/// decision. Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait DecisionGateway: Send + Sync {
    /// Send `[system_prompt] + history` and return the raw response text.
    ///
    /// `schema` is the JSON shape the response should conform to; adapters
    /// that support constrained output pass it along.
    async fn decide(
        &self,
        system_prompt: &str,
        history: &[Message],
        schema: &Value,
    ) -> Result<String, GatewayError>;

    /// Name of the model answering, for logs.
    fn model_name(&self) -> &str;
}
