//! Decision parsing from model response text.
//!
//! Models do not always return bare JSON. The parser accepts, in order:
//! 1. the whole response as a JSON object
//! 2. a ` ```json ` (or bare ` ``` `) fenced block
//! 3. the span from the first `{` to the last `}`
//!
//! Before deserializing, a few common shape slips are normalized: `null`
//! fields are dropped, a single string `thoughts`/`notes` becomes a list,
//! and quoted note indices become integers.

use super::entities::Decision;
use serde_json::{Map, Value};
use thiserror::Error;

/// Why a response could not be turned into a [`Decision`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecisionParseError {
    #[error("Empty decision response")]
    Empty,

    #[error("No JSON object found in decision response")]
    NoJson,

    #[error("Malformed decision: {0}")]
    Malformed(String),
}

/// Parse a [`Decision`] from raw model output.
pub fn parse_decision(response: &str) -> Result<Decision, DecisionParseError> {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return Err(DecisionParseError::Empty);
    }

    let object = extract_object(trimmed).ok_or(DecisionParseError::NoJson)?;
    let normalized = normalize(object);
    serde_json::from_value(Value::Object(normalized))
        .map_err(|e| DecisionParseError::Malformed(e.to_string()))
}

fn extract_object(text: &str) -> Option<Map<String, Value>> {
    as_object(text)
        .or_else(|| fenced_block(text).and_then(|block| as_object(&block)))
        .or_else(|| {
            let start = text.find('{')?;
            let end = text.rfind('}')?;
            (start < end).then(|| as_object(&text[start..=end])).flatten()
        })
}

fn as_object(candidate: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(candidate.trim()) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn fenced_block(text: &str) -> Option<String> {
    let mut in_block = false;
    let mut current = String::new();

    for line in text.lines() {
        let marker = line.trim();
        if !in_block && (marker == "```json" || marker == "```") {
            in_block = true;
            current.clear();
        } else if in_block && marker == "```" {
            return Some(current);
        } else if in_block {
            current.push_str(line);
            current.push('\n');
        }
    }
    None
}

fn normalize(mut object: Map<String, Value>) -> Map<String, Value> {
    object.retain(|_, v| !v.is_null());

    for key in ["thoughts", "notes"] {
        if let Some(Value::String(s)) = object.get(key) {
            let single = Value::Array(vec![Value::String(s.clone())]);
            object.insert(key.to_string(), single);
        }
    }

    if let Some(Value::Array(indices)) = object.get_mut("delete_notes") {
        let cleaned: Vec<Value> = indices
            .iter()
            .filter_map(|v| match v {
                Value::Number(n) => n.as_i64().map(Value::from),
                Value::String(s) => s.trim().parse::<i64>().ok().map(Value::from),
                _ => None,
            })
            .collect();
        *indices = cleaned;
    }

    object
}
