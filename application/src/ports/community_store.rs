//! Community store port
//!
//! Defines the persistence contract for the registry, forum and chat.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use polis_domain::{
    AgentKey, AgentRecord, ChatMessage, DomainError, ForumPost, ForumThread, JoinOutcome,
    RecordMutation, ThreadId,
};
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Agent record not found: {0}")]
    RecordNotFound(String),

    #[error("Forum thread not found: {0}")]
    ThreadNotFound(String),

    #[error("Key already exists: {0}")]
    KeyConflict(String),

    #[error("Identity is already active as {active_as}; cannot activate {requested}")]
    IdentityActive { requested: String, active_as: String },

    #[error("Mutation rejected: {0}")]
    Mutation(#[from] DomainError),

    #[error("Concurrent update did not settle for {0}")]
    Contention(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Store for agent records, forum threads and chat messages.
///
/// Implementations must be safe for concurrent callers. Record changes go
/// through [`CommunityStore::modify_agent_record`], which applies a
/// [`RecordMutation`] as one atomic read-modify-write; callers never write
/// back a whole record they read earlier.
///
/// An identity is active under at most one name. Inserting an active record
/// and applying an activating mutation both fail with
/// [`StoreError::IdentityActive`] when another name of the same identity is
/// active, and the check happens in the same atomic unit as the write.
#[async_trait]
pub trait CommunityStore: Send + Sync {
    /// Insert a new record. Fails with [`StoreError::KeyConflict`] if a
    /// record with the same (identity, name) already exists.
    async fn save_agent_record(&self, record: AgentRecord) -> Result<(), StoreError>;

    async fn find_agent_record(&self, key: &AgentKey) -> Result<Option<AgentRecord>, StoreError>;

    async fn list_agent_records(&self, active_only: bool) -> Result<Vec<AgentRecord>, StoreError>;

    /// Apply `mutation` to the record under `key` and return the result.
    ///
    /// A rename onto an existing key fails with [`StoreError::KeyConflict`].
    async fn modify_agent_record(
        &self,
        key: &AgentKey,
        mutation: &RecordMutation,
    ) -> Result<AgentRecord, StoreError>;

    /// Create the record under `key`, or reactivate it if it exists.
    ///
    /// An already active record is left untouched. The one-active-name rule
    /// is enforced by the insert and the rejoin themselves, so concurrent
    /// joins of one identity under different names admit only one of them.
    async fn join_agent_record(
        &self,
        key: &AgentKey,
        persona: &str,
        at: DateTime<Utc>,
    ) -> Result<JoinOutcome, StoreError> {
        if let Some(existing) = self.find_agent_record(key).await? {
            if existing.active {
                return Ok(JoinOutcome::AlreadyActive);
            }
            return self.rejoin_agent_record(key, persona, at).await;
        }

        match self
            .save_agent_record(AgentRecord::joined(key, persona, at))
            .await
        {
            Ok(()) => Ok(JoinOutcome::Joined),
            // Created by another caller between the read and the insert.
            Err(StoreError::KeyConflict(_)) => match self.find_agent_record(key).await? {
                Some(record) if record.active => Ok(JoinOutcome::AlreadyActive),
                _ => self.rejoin_agent_record(key, persona, at).await,
            },
            Err(e) => Err(e),
        }
    }

    async fn rejoin_agent_record(
        &self,
        key: &AgentKey,
        persona: &str,
        at: DateTime<Utc>,
    ) -> Result<JoinOutcome, StoreError> {
        let mutation = RecordMutation::Rejoin {
            persona: persona.to_string(),
            at,
        };
        self.modify_agent_record(key, &mutation).await?;
        Ok(JoinOutcome::Rejoined)
    }

    async fn save_forum_thread(&self, thread: ForumThread) -> Result<(), StoreError>;

    /// Append a reply, keeping the thread's replies ordered by timestamp.
    async fn save_forum_reply(&self, thread_id: &ThreadId, reply: ForumPost)
    -> Result<(), StoreError>;

    async fn list_forum_threads(&self) -> Result<Vec<ForumThread>, StoreError>;

    async fn find_forum_thread(&self, id: &ThreadId) -> Result<Option<ForumThread>, StoreError>;

    async fn save_chat_message(&self, message: ChatMessage) -> Result<(), StoreError>;

    /// Chat messages oldest first; with a limit, only the most recent ones.
    async fn list_chat_messages(&self, limit: Option<usize>)
    -> Result<Vec<ChatMessage>, StoreError>;

    /// Remove every record, thread and message.
    async fn clear_all(&self) -> Result<(), StoreError>;
}
