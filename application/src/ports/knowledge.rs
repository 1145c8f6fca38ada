//! Knowledge lookup port
//!
//! An encyclopedia the agents can read from.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during knowledge lookups
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KnowledgeError {
    #[error("No article found for '{0}'")]
    NotFound(String),

    #[error("Lookup failed: {0}")]
    RequestFailed(String),
}

#[async_trait]
pub trait KnowledgeLookupPort: Send + Sync {
    /// Plain text of the article with the given title.
    async fn lookup(&self, title: &str) -> Result<String, KnowledgeError>;
}
