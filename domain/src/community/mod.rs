//! Community domain: the registry, forum and chat entities.
//!
//! - [`record`]: registry records and atomic [`RecordMutation`]s
//! - [`history`]: the FIFO-capped thoughts/activity lists
//! - [`forum`]: threads, posts, attachments and chat messages
//! - [`projection`]: read-side views (forum page, full thread, chat window)

pub mod forum;
pub mod history;
pub mod projection;
pub mod record;

pub use forum::{
    Attachment, ChatMessage, ForumPost, ForumThread, ThreadId, UPLOADS_URL_PREFIX, media_type_for,
};
pub use history::{BoundedHistory, HISTORY_CAPACITY};
pub use projection::{ForumPageShape, chat_window, full_thread};
pub use record::{AgentRecord, RecordMutation, active_alias};

/// Persona recorded when a member joins without one.
pub fn default_join_persona(name: &str) -> String {
    format!(
        "You are {}. An advanced agent that can perform a variety of tasks.",
        name
    )
}

/// How a join request was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// A new record was created.
    Joined,
    /// An inactive record was reactivated with its history intact.
    Rejoined,
    /// The record was already active; nothing changed.
    AlreadyActive,
}

impl JoinOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinOutcome::Joined => "joined",
            JoinOutcome::Rejoined => "rejoined",
            JoinOutcome::AlreadyActive => "already active",
        }
    }
}

impl std::fmt::Display for JoinOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_join_persona() {
        assert_eq!(
            default_join_persona("Ada"),
            "You are Ada. An advanced agent that can perform a variety of tasks."
        );
    }
}
