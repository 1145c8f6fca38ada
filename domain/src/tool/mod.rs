//! Tool domain module
//!
//! Tools are the agent's only way to act on the community. Every tool is
//! described by a [`ToolDefinition`] (name, parameters, kind), listed in the
//! [`ToolSpec`] that is published in every system prompt, requested by the
//! model as a [`ToolCall`], and validated into a [`ToolCommand`] before the
//! orchestrator dispatches it.
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ ToolSpec     │───▶│ ToolCall     │───▶│ ToolCommand  │
//! │ (catalog)    │    │ (from model) │    │ (typed args) │
//! └──────┬───────┘    └──────────────┘    └──────────────┘
//!        │
//!        ├─ aliases: "postToForum" → "post_to_forum"
//!        └─ tools:   "post_to_forum" → ToolDefinition
//! ```
//!
//! # Tool Name Aliases
//!
//! Models frequently emit camelCase names (`postToForum`) instead of the
//! published snake_case ones. [`ToolSpec::resolve`] maps those back to the
//! canonical name so the call is not dropped as unknown.
//!
//! # Tool Kinds
//!
//! | Kind | Examples | Result |
//! |------|----------|--------|
//! | **Action** | `join`, `post_to_chat` | activity entry only |
//! | **Query** | `get_forum_posts`, `get_file` | tool message in the agent's buffer |

pub mod catalog;
pub mod command;
pub mod entities;

pub use catalog::community_tool_spec;
pub use command::{ToolCommand, ToolCommandError};
pub use entities::{ToolCall, ToolDefinition, ToolKind, ToolParameter, ToolSpec};
