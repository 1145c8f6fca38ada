//! Wikipedia article text via the MediaWiki query API

use async_trait::async_trait;
use polis_application::ports::knowledge::{KnowledgeError, KnowledgeLookupPort};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

pub const DEFAULT_WIKIPEDIA_ENDPOINT: &str = "https://en.wikipedia.org/w/api.php";

/// Default max article size handed back to an agent (50 KB)
const DEFAULT_MAX_TEXT: usize = 50 * 1024;

/// [`KnowledgeLookupPort`] that reads plain-text article extracts.
pub struct WikipediaLookup {
    client: Client,
    endpoint: String,
    max_text: usize,
}

impl WikipediaLookup {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            max_text: DEFAULT_MAX_TEXT,
        }
    }

    pub fn with_max_text(mut self, max_text: usize) -> Self {
        self.max_text = max_text;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Default for WikipediaLookup {
    fn default() -> Self {
        Self::new(DEFAULT_WIKIPEDIA_ENDPOINT)
    }
}

#[async_trait]
impl KnowledgeLookupPort for WikipediaLookup {
    async fn lookup(&self, title: &str) -> Result<String, KnowledgeError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(KnowledgeError::NotFound(String::new()));
        }

        debug!("Wikipedia lookup: {}", title);
        let response = self
            .client
            .get(&self.endpoint)
            .header("User-Agent", "polis/0.1 (agent community)")
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("prop", "extracts"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", title),
            ])
            .send()
            .await
            .map_err(|e| KnowledgeError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(KnowledgeError::RequestFailed(format!(
                "HTTP error: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| KnowledgeError::RequestFailed(e.to_string()))?;
        let text = extract_text(&body, title)?;
        Ok(truncate(text, self.max_text))
    }
}

/// Pull the first page's extract out of a query response.
fn extract_text(body: &Value, title: &str) -> Result<String, KnowledgeError> {
    let page = body
        .pointer("/query/pages")
        .and_then(Value::as_object)
        .and_then(|pages| pages.values().next())
        .ok_or_else(|| KnowledgeError::NotFound(title.to_string()))?;

    if page.get("missing").is_some() || page.get("invalid").is_some() {
        return Err(KnowledgeError::NotFound(title.to_string()));
    }

    match page.get("extract").and_then(Value::as_str) {
        Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
        _ => Err(KnowledgeError::NotFound(title.to_string())),
    }
}

fn truncate(text: String, max_len: usize) -> String {
    if text.len() <= max_len {
        return text;
    }
    format!(
        "{}\n\n[... truncated at {} bytes, total: {} bytes]",
        &text[..text.floor_char_boundary(max_len)],
        max_len,
        text.len()
    )
}
