//! Decision entity: one pass's structured output from the decision model.

use crate::tool::entities::ToolCall;
use serde::{Deserialize, Serialize};

/// Structured output of one decision call.
///
/// Every field is optional on the wire. Missing fields take the
/// [`Default`] values, which keep the agent running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Decision {
    /// Thoughts for this pass; shown in the registry, not kept by the agent.
    pub thoughts: Vec<String>,
    /// Single note to add (older response shape).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Notes to add.
    pub notes: Vec<String>,
    pub tool_calls: Vec<ToolCall>,
    pub instructions_for_next_pass: String,
    pub clear_message_buffer: bool,
    /// Indices into the note list as enumerated in this pass's prompt.
    pub delete_notes: Vec<i64>,
    pub clear_all_notes: bool,
    pub should_continue: bool,
}

impl Default for Decision {
    fn default() -> Self {
        Self {
            thoughts: Vec::new(),
            note: None,
            notes: Vec::new(),
            tool_calls: Vec::new(),
            instructions_for_next_pass: String::new(),
            clear_message_buffer: false,
            delete_notes: Vec::new(),
            clear_all_notes: false,
            should_continue: true,
        }
    }
}

impl Decision {
    /// Non-blank notes to add, the single `note` first.
    pub fn new_notes(&self) -> Vec<String> {
        self.note
            .iter()
            .chain(self.notes.iter())
            .filter(|n| !n.trim().is_empty())
            .cloned()
            .collect()
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default_and_keep_running() {
        let decision: Decision = serde_json::from_str("{}").unwrap();
        assert!(decision.should_continue);
        assert!(decision.thoughts.is_empty());
        assert!(!decision.clear_all_notes);
        assert!(!decision.has_tool_calls());
    }

    #[test]
    fn test_new_notes_merges_legacy_field() {
        let decision = Decision {
            note: Some("first".into()),
            notes: vec!["second".into(), "  ".into()],
            ..Default::default()
        };
        assert_eq!(decision.new_notes(), vec!["first", "second"]);
    }
}
