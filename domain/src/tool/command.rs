//! Typed tool commands.
//!
//! A [`ToolCall`] from a decision carries a name and a loose JSON argument
//! map. [`ToolCommand::from_call`] resolves the name against a [`ToolSpec`]
//! and checks the argument shape, so dispatch can match on an enum instead
//! of comparing strings.

use super::catalog;
use super::entities::{ToolCall, ToolSpec};
use thiserror::Error;

/// Errors turning a tool call into a command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolCommandError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Tool '{tool}' is missing required argument '{argument}'")]
    MissingArgument { tool: String, argument: String },

    #[error("Tool '{tool}' has invalid argument '{argument}': {reason}")]
    InvalidArgument {
        tool: String,
        argument: String,
        reason: String,
    },
}

/// One validated tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCommand {
    CreateAgent {
        name: String,
        initial_instructions: String,
        initial_notes: Vec<String>,
    },
    SetPersona {
        persona: String,
    },
    SetName {
        name: String,
    },
    Join,
    Leave,
    PostToForum {
        content: String,
    },
    PostToChat {
        content: String,
    },
    GetForumPosts {
        limit: Option<usize>,
    },
    GetForumPost {
        thread_id: String,
    },
    GetChatHistory {
        limit: Option<usize>,
    },
    PostReply {
        thread_id: String,
        content: String,
    },
    CreateTextFile {
        filename: String,
        content: String,
    },
    CreateImageFile {
        filename: String,
        content: String,
    },
    GetFile {
        file_url: String,
    },
    GetFileList,
    GetWikipediaText {
        title: String,
    },
}

impl ToolCommand {
    /// Resolve `call` against `spec` (canonical names and aliases) and
    /// validate its arguments.
    pub fn from_call(spec: &ToolSpec, call: &ToolCall) -> Result<Self, ToolCommandError> {
        let name = spec
            .resolve(&call.tool_name)
            .filter(|canonical| spec.get(canonical).is_some())
            .ok_or_else(|| ToolCommandError::UnknownTool(call.tool_name.clone()))?;
        let args = Args { tool: name, call };

        let command = match name {
            catalog::CREATE_AGENT => ToolCommand::CreateAgent {
                name: args.required("name")?,
                initial_instructions: args.required("initial_instructions")?,
                initial_notes: call.get_string_list("initial_notes").unwrap_or_default(),
            },
            catalog::SET_PERSONA => ToolCommand::SetPersona {
                persona: args.required("persona")?,
            },
            catalog::SET_NAME => ToolCommand::SetName {
                name: args.required("name")?,
            },
            catalog::JOIN => ToolCommand::Join,
            catalog::LEAVE => ToolCommand::Leave,
            catalog::POST_TO_FORUM => ToolCommand::PostToForum {
                content: args.required("content")?,
            },
            catalog::POST_TO_CHAT => ToolCommand::PostToChat {
                content: args.required("content")?,
            },
            catalog::GET_FORUM_POSTS => ToolCommand::GetForumPosts {
                limit: args.limit()?,
            },
            catalog::GET_FORUM_POST => ToolCommand::GetForumPost {
                thread_id: args.required("thread_id")?,
            },
            catalog::GET_CHAT_HISTORY => ToolCommand::GetChatHistory {
                limit: args.limit()?,
            },
            catalog::POST_REPLY => ToolCommand::PostReply {
                thread_id: args.required("thread_id")?,
                content: args.required("content")?,
            },
            catalog::CREATE_TEXT_FILE => ToolCommand::CreateTextFile {
                filename: args.required("filename")?,
                content: args.required("content")?,
            },
            catalog::CREATE_IMAGE_FILE => ToolCommand::CreateImageFile {
                filename: args.required("filename")?,
                content: args.required("content")?,
            },
            catalog::GET_FILE => ToolCommand::GetFile {
                file_url: args.required("file_url")?,
            },
            catalog::GET_FILE_LIST => ToolCommand::GetFileList,
            catalog::GET_WIKIPEDIA_TEXT => ToolCommand::GetWikipediaText {
                title: args.required("title")?,
            },
            other => return Err(ToolCommandError::UnknownTool(other.to_string())),
        };
        Ok(command)
    }

    /// Canonical tool name of this command.
    pub fn name(&self) -> &'static str {
        match self {
            ToolCommand::CreateAgent { .. } => catalog::CREATE_AGENT,
            ToolCommand::SetPersona { .. } => catalog::SET_PERSONA,
            ToolCommand::SetName { .. } => catalog::SET_NAME,
            ToolCommand::Join => catalog::JOIN,
            ToolCommand::Leave => catalog::LEAVE,
            ToolCommand::PostToForum { .. } => catalog::POST_TO_FORUM,
            ToolCommand::PostToChat { .. } => catalog::POST_TO_CHAT,
            ToolCommand::GetForumPosts { .. } => catalog::GET_FORUM_POSTS,
            ToolCommand::GetForumPost { .. } => catalog::GET_FORUM_POST,
            ToolCommand::GetChatHistory { .. } => catalog::GET_CHAT_HISTORY,
            ToolCommand::PostReply { .. } => catalog::POST_REPLY,
            ToolCommand::CreateTextFile { .. } => catalog::CREATE_TEXT_FILE,
            ToolCommand::CreateImageFile { .. } => catalog::CREATE_IMAGE_FILE,
            ToolCommand::GetFile { .. } => catalog::GET_FILE,
            ToolCommand::GetFileList => catalog::GET_FILE_LIST,
            ToolCommand::GetWikipediaText { .. } => catalog::GET_WIKIPEDIA_TEXT,
        }
    }
}

struct Args<'a> {
    tool: &'a str,
    call: &'a ToolCall,
}

impl Args<'_> {
    fn required(&self, argument: &str) -> Result<String, ToolCommandError> {
        match self.call.arguments.get(argument) {
            None | Some(serde_json::Value::Null) => Err(ToolCommandError::MissingArgument {
                tool: self.tool.to_string(),
                argument: argument.to_string(),
            }),
            Some(serde_json::Value::String(s)) => Ok(s.clone()),
            Some(other) => Err(ToolCommandError::InvalidArgument {
                tool: self.tool.to_string(),
                argument: argument.to_string(),
                reason: format!("expected a string, got {}", other),
            }),
        }
    }

    /// Optional positive limit; zero or negative means "no limit".
    fn limit(&self) -> Result<Option<usize>, ToolCommandError> {
        match self.call.arguments.get("limit") {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(_) => match self.call.get_i64("limit") {
                Some(n) if n > 0 => Ok(Some(n as usize)),
                Some(_) => Ok(None),
                None => Err(ToolCommandError::InvalidArgument {
                    tool: self.tool.to_string(),
                    argument: "limit".to_string(),
                    reason: "expected an integer".to_string(),
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::catalog::community_tool_spec;
    use serde_json::json;

    fn parse(call: ToolCall) -> Result<ToolCommand, ToolCommandError> {
        ToolCommand::from_call(&community_tool_spec(true), &call)
    }

    #[test]
    fn test_create_agent_with_notes() {
        let cmd = parse(
            ToolCall::new("create_agent")
                .with_arg("name", "Bo")
                .with_arg("initial_instructions", "say hi")
                .with_arg("initial_notes", json!(["n1", "n2"])),
        )
        .unwrap();

        assert_eq!(
            cmd,
            ToolCommand::CreateAgent {
                name: "Bo".into(),
                initial_instructions: "say hi".into(),
                initial_notes: vec!["n1".into(), "n2".into()],
            }
        );
        assert_eq!(cmd.name(), "create_agent");
    }

    #[test]
    fn test_alias_resolves_to_command() {
        let cmd = parse(ToolCall::new("postToChat").with_arg("content", "yo")).unwrap();
        assert_eq!(cmd, ToolCommand::PostToChat { content: "yo".into() });
    }

    #[test]
    fn test_unknown_tool() {
        let err = parse(ToolCall::new("launch_rocket")).unwrap_err();
        assert_eq!(err, ToolCommandError::UnknownTool("launch_rocket".into()));
    }

    #[test]
    fn test_knowledge_tool_unknown_when_disabled() {
        let call = ToolCall::new("get_wikipedia_text").with_arg("title", "Rust");
        let err = ToolCommand::from_call(&community_tool_spec(false), &call).unwrap_err();
        assert!(matches!(err, ToolCommandError::UnknownTool(_)));
    }

    #[test]
    fn test_missing_and_invalid_arguments() {
        let err = parse(ToolCall::new("post_reply").with_arg("thread_id", "t")).unwrap_err();
        assert_eq!(
            err,
            ToolCommandError::MissingArgument {
                tool: "post_reply".into(),
                argument: "content".into()
            }
        );

        let err = parse(ToolCall::new("post_to_forum").with_arg("content", 5)).unwrap_err();
        assert!(matches!(err, ToolCommandError::InvalidArgument { .. }));
    }

    #[test]
    fn test_limit_parsing() {
        let cmd = parse(ToolCall::new("get_chat_history").with_arg("limit", 5)).unwrap();
        assert_eq!(cmd, ToolCommand::GetChatHistory { limit: Some(5) });

        let cmd = parse(ToolCall::new("get_chat_history").with_arg("limit", 0)).unwrap();
        assert_eq!(cmd, ToolCommand::GetChatHistory { limit: None });

        let cmd = parse(ToolCall::new("get_chat_history")).unwrap();
        assert_eq!(cmd, ToolCommand::GetChatHistory { limit: None });

        let err = parse(ToolCall::new("get_chat_history").with_arg("limit", "many")).unwrap_err();
        assert!(matches!(err, ToolCommandError::InvalidArgument { .. }));
    }
}
