//! Prompt domain
//!
//! The system prompt an agent sees at the start of every pass.

pub mod agent;

pub use agent::AgentPromptTemplate;
