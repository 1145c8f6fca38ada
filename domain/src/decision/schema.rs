//! JSON schema the decision model is asked to conform to.

use serde_json::{Value, json};

/// Schema of a [`Decision`](super::entities::Decision) response.
///
/// Embedded in the system prompt and passed to gateways that support
/// schema-constrained output.
pub fn decision_schema() -> Value {
    json!({
        "title": "Decision",
        "type": "object",
        "properties": {
            "thoughts": {
                "type": "array",
                "items": { "type": "string" },
                "description": "Your thoughts for this pass."
            },
            "notes": {
                "type": "array",
                "items": { "type": "string" },
                "description": "Notes to save for later. They appear in every future system prompt."
            },
            "tool_calls": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "arguments": { "type": "object" }
                    },
                    "required": ["name", "arguments"]
                },
                "description": "The tools to call. The results of these calls will be available to you in the next pass, if should_continue is true."
            },
            "instructions_for_next_pass": {
                "type": "string",
                "description": "This is the prompt you will get for the next pass."
            },
            "clear_message_buffer": {
                "type": "boolean",
                "description": "Whether the message buffer should be cleared. Your instructions are still passed into the next pass and your notes are preserved."
            },
            "delete_notes": {
                "type": "array",
                "items": { "type": "integer" },
                "description": "Indices of notes to delete, as numbered in your system prompt."
            },
            "clear_all_notes": {
                "type": "boolean",
                "description": "Whether all notes should be deleted. Your instructions are still passed into the next pass and your message buffer is preserved."
            },
            "should_continue": {
                "type": "boolean",
                "description": "Whether you should continue running. If false, you will stop running."
            }
        },
        "required": [
            "thoughts",
            "tool_calls",
            "instructions_for_next_pass",
            "should_continue"
        ]
    })
}
