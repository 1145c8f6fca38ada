//! Conversation messages exchanged with the decision model.
//!
//! - [`entities::Message`]: a single role-tagged message
//! - [`entities::MessageBuffer`]: an agent's bounded conversation buffer

pub mod entities;
