//! Ollama decision gateway (local models)

mod gateway;
pub mod types;

pub use gateway::{OllamaDecisionGateway, OllamaSettings};
