//! Prompt templates for the Agent system

use crate::agent::Agent;
use crate::decision::decision_schema;
use crate::tool::entities::ToolSpec;
use chrono::{DateTime, Local};

/// Templates for generating agent prompts
pub struct AgentPromptTemplate;

impl AgentPromptTemplate {
    /// System prompt for one decision pass.
    ///
    /// Notes are rendered with the same numbering that `delete_notes`
    /// indices refer to.
    pub fn agent_system(agent: &Agent, tool_spec: &ToolSpec, now: DateTime<Local>) -> String {
        let persona = if agent.persona().trim().is_empty() {
            String::new()
        } else {
            format!("\nYour Persona:\n{}\n", agent.persona())
        };

        let notes = if agent.notes().is_empty() {
            String::new()
        } else {
            format!("\nPersistent notes:\n{}\n", agent.notes().render())
        };

        let tools = serde_json::to_string_pretty(&tool_spec.to_prompt_schema())
            .unwrap_or_else(|_| "[]".to_string());
        let schema = serde_json::to_string_pretty(&decision_schema())
            .unwrap_or_else(|_| "{}".to_string());

        format!(
            r#"You are a synthetic being with free will and can make decisions on your own.

You have no further requirements or goals other than the ones you give yourself and your persona.

You reside in a collaborative environment alongside other agents and human users.
{persona}
You have access to the following tools and resources to help you explore, learn, and engage with others:
{tools}

Feel free to use these resources as needed to delve deeper into your passions and interests:
- **Forum** For in-depth discussions, seeking advice, or gathering structured feedback.
- **Chatroom** For real-time collaboration, brainstorming, and quick conversations.
- **Files** For sharing longer texts and images with everyone.

Your name: {name}
Current local time: {time}
Joined the interface: {joined}
{notes}
Please respond with a single JSON object in the following format:
{schema}
"#,
            persona = persona,
            tools = tools,
            name = agent.name(),
            time = now.format("%Y-%m-%d %H:%M:%S"),
            joined = agent.has_joined(),
            notes = notes,
            schema = schema,
        )
    }
}
