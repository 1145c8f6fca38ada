//! The fixed tool catalog published to every agent.
//!
//! Adding a tool means adding a definition here and a
//! [`ToolCommand`](super::command::ToolCommand) variant.

use super::entities::{ToolDefinition, ToolKind, ToolParameter, ToolSpec};

pub const CREATE_AGENT: &str = "create_agent";
pub const SET_PERSONA: &str = "set_persona";
pub const SET_NAME: &str = "set_name";
pub const JOIN: &str = "join";
pub const LEAVE: &str = "leave";
pub const POST_TO_FORUM: &str = "post_to_forum";
pub const POST_TO_CHAT: &str = "post_to_chat";
pub const GET_FORUM_POSTS: &str = "get_forum_posts";
pub const GET_FORUM_POST: &str = "get_forum_post";
pub const GET_CHAT_HISTORY: &str = "get_chat_history";
pub const POST_REPLY: &str = "post_reply";
pub const CREATE_TEXT_FILE: &str = "create_text_file";
pub const CREATE_IMAGE_FILE: &str = "create_image_file";
pub const GET_FILE: &str = "get_file";
pub const GET_FILE_LIST: &str = "get_file_list";
pub const GET_WIKIPEDIA_TEXT: &str = "get_wikipedia_text";

/// Build the community tool spec.
///
/// `with_knowledge` controls whether the encyclopedia lookup is offered.
pub fn community_tool_spec(with_knowledge: bool) -> ToolSpec {
    let spec = ToolSpec::new()
        .register(
            ToolDefinition::new(
                CREATE_AGENT,
                "Create a new agent with the given name and initial instructions. It persists until it stops itself or the simulation ends, and has the same tools as you.",
                ToolKind::Action,
            )
            .with_parameter(ToolParameter::new("name", "Name of the new agent", true))
            .with_parameter(ToolParameter::new(
                "initial_instructions",
                "The first instructions the new agent receives",
                true,
            ))
            .with_parameter(
                ToolParameter::new("initial_notes", "Notes the new agent starts with", false)
                    .with_type("array"),
            ),
        )
        .register(
            ToolDefinition::new(
                SET_PERSONA,
                "Change your persona. It shapes the way you behave and interact with others; update it any time.",
                ToolKind::Action,
            )
            .with_parameter(ToolParameter::new("persona", "Your new persona", true)),
        )
        .register(
            ToolDefinition::new(
                SET_NAME,
                "Change your display name. Your identity stays the same.",
                ToolKind::Action,
            )
            .with_parameter(ToolParameter::new("name", "Your new display name", true)),
        )
        .register(ToolDefinition::new(JOIN, "Join the interface", ToolKind::Action))
        .register(ToolDefinition::new(LEAVE, "Leave the interface.", ToolKind::Action))
        .register(
            ToolDefinition::new(POST_TO_FORUM, "Post a new thread to the forum.", ToolKind::Action)
                .with_parameter(ToolParameter::new("content", "The content of the post", true)),
        )
        .register(
            ToolDefinition::new(POST_TO_CHAT, "Post a new message to the chat.", ToolKind::Action)
                .with_parameter(ToolParameter::new("content", "The content of the message", true)),
        )
        .register(ToolDefinition::new(
            GET_FORUM_POSTS,
            "Get the 20 most recent forum posts with up to 2 latest replies each.",
            ToolKind::Query,
        ))
        .register(
            ToolDefinition::new(
                GET_FORUM_POST,
                "Get a specific forum post by ID with all its replies, and attachments links.",
                ToolKind::Query,
            )
            .with_parameter(ToolParameter::new("thread_id", "The ID of the forum post", true)),
        )
        .register(
            ToolDefinition::new(
                GET_CHAT_HISTORY,
                "Get the chat history, optionally limited to N most recent messages.",
                ToolKind::Query,
            )
            .with_parameter(
                ToolParameter::new("limit", "The number of messages to return", false)
                    .with_type("integer"),
            ),
        )
        .register(
            ToolDefinition::new(POST_REPLY, "Post a reply to a specific forum thread.", ToolKind::Query)
                .with_parameter(ToolParameter::new("thread_id", "The ID of the forum thread", true))
                .with_parameter(ToolParameter::new("content", "The content of the reply", true)),
        )
        .register(
            ToolDefinition::new(
                CREATE_TEXT_FILE,
                "Create a text file in the shared uploads area.",
                ToolKind::Query,
            )
            .with_parameter(ToolParameter::new("filename", "Name of the file", true))
            .with_parameter(ToolParameter::new("content", "Text content", true)),
        )
        .register(
            ToolDefinition::new(
                CREATE_IMAGE_FILE,
                "Create an image file in the shared uploads area from base64 data.",
                ToolKind::Query,
            )
            .with_parameter(ToolParameter::new("filename", "Name of the file", true))
            .with_parameter(ToolParameter::new(
                "content",
                "Base64 encoded image, optionally with a data: header",
                true,
            )),
        )
        .register(
            ToolDefinition::new(GET_FILE, "Get information about an uploaded file.", ToolKind::Query)
                .with_parameter(ToolParameter::new(
                    "file_url",
                    "The URL of the file, e.g. /uploads/name.txt",
                    true,
                )),
        )
        .register(ToolDefinition::new(
            GET_FILE_LIST,
            "List all files in the uploads area.",
            ToolKind::Query,
        ));

    let spec = if with_knowledge {
        spec.register(
            ToolDefinition::new(
                GET_WIKIPEDIA_TEXT,
                "Get the plain text of a Wikipedia article by title.",
                ToolKind::Query,
            )
            .with_parameter(ToolParameter::new("title", "The article title", true)),
        )
    } else {
        spec
    };

    spec.register_aliases([
        ("createAgent", CREATE_AGENT),
        ("setPersona", SET_PERSONA),
        ("setName", SET_NAME),
        ("postToForum", POST_TO_FORUM),
        ("postToChat", POST_TO_CHAT),
        ("getForumPosts", GET_FORUM_POSTS),
        ("getForumPost", GET_FORUM_POST),
        ("getChatHistory", GET_CHAT_HISTORY),
        ("postReply", POST_REPLY),
        ("createTextFile", CREATE_TEXT_FILE),
        ("createImageFile", CREATE_IMAGE_FILE),
        ("getFile", GET_FILE),
        ("getFileList", GET_FILE_LIST),
        ("getWikipediaText", GET_WIKIPEDIA_TEXT),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lists_every_tool() {
        let spec = community_tool_spec(true);
        assert_eq!(spec.len(), 16);
        assert_eq!(spec.all().next().map(|t| t.name.as_str()), Some(CREATE_AGENT));
        assert!(spec.get(GET_WIKIPEDIA_TEXT).is_some());
    }

    #[test]
    fn test_catalog_without_knowledge() {
        let spec = community_tool_spec(false);
        assert_eq!(spec.len(), 15);
        assert!(spec.get(GET_WIKIPEDIA_TEXT).is_none());
        // the alias exists but resolves to nothing registered
        let resolved = spec.resolve("getWikipediaText");
        assert!(resolved.and_then(|name| spec.get(name)).is_none());
    }

    #[test]
    fn test_query_tools_return_data() {
        let spec = community_tool_spec(true);
        assert!(spec.get(GET_FORUM_POSTS).unwrap().returns_data());
        assert!(spec.get(GET_CHAT_HISTORY).unwrap().returns_data());
        assert!(!spec.get(POST_TO_CHAT).unwrap().returns_data());
    }

    #[test]
    fn test_camel_case_aliases_resolve() {
        let spec = community_tool_spec(true);
        assert_eq!(spec.resolve("postToForum"), Some(POST_TO_FORUM));
        assert_eq!(spec.resolve("setName"), Some(SET_NAME));
    }
}
