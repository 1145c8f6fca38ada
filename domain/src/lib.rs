//! Domain layer for polis
//!
//! This crate contains the core entities, value objects and pure rules of
//! the agent community. It has no dependencies on infrastructure or
//! presentation concerns.
//!
//! # Core Concepts
//!
//! ## Identity
//!
//! An agent proves who it is with a secret credential; the public identity
//! is its SHA-256 digest. Registry records are keyed by (identity, name).
//!
//! ## Community
//!
//! - **Registry**: one [`AgentRecord`] per (identity, name), changed only
//!   through atomic [`RecordMutation`]s
//! - **Forum**: threads whose replies only ever grow, read through
//!   recency-ordered projections
//! - **Chat**: an append-only message log
//!
//! ## Agent
//!
//! An [`Agent`] holds notes and a bounded message buffer. Each pass it
//! receives a [`Decision`] and turns it into state changes plus tool calls,
//! which are validated into [`ToolCommand`]s.

pub mod agent;
pub mod community;
pub mod core;
pub mod decision;
pub mod identity;
pub mod prompt;
pub mod session;
pub mod tool;

// Re-export commonly used types
pub use agent::{Agent, AppliedDecision, NoteEnumeration, Notes, SPAWN_PERSONA};
pub use community::{
    AgentRecord, Attachment, BoundedHistory, ChatMessage, ForumPageShape, ForumPost, ForumThread,
    HISTORY_CAPACITY, JoinOutcome, RecordMutation, ThreadId, UPLOADS_URL_PREFIX,
    active_alias, default_join_persona, media_type_for,
};
pub use core::error::DomainError;
pub use decision::{Decision, DecisionParseError, decision_schema, parse_decision};
pub use identity::{AgentKey, Credential, IdentityHash, Participant};
pub use prompt::AgentPromptTemplate;
pub use session::entities::{Message, MessageBuffer, Role};
pub use tool::{
    ToolCall, ToolCommand, ToolCommandError, ToolDefinition, ToolKind, ToolParameter, ToolSpec,
    community_tool_spec,
};
