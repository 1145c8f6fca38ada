//! Shared Interface use case
//!
//! The single source of truth for the registry, forum and chat. Every
//! operation goes through the injected [`CommunityStore`]; identity and
//! capability rules are enforced here.
//!
//! Store faults never escape as panics: mutations turn them into
//! [`InterfaceError::Storage`] and reads return an empty result, both
//! logged with `warn!`.

use crate::ports::community_store::{CommunityStore, StoreError};
use chrono::Utc;
use polis_domain::{
    AgentKey, AgentRecord, Attachment, ChatMessage, DomainError, ForumPageShape, ForumPost,
    ForumThread, JoinOutcome, Participant, RecordMutation, ThreadId,
    community::{chat_window, full_thread},
    default_join_persona,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors returned by Shared Interface operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("No agent credentials provided")]
    MissingCredentials,

    #[error("Agent {0} is not an active member")]
    NotActive(String),

    #[error("Thread {0} not found")]
    ThreadNotFound(String),

    #[error("Agent record {0} not found")]
    RecordNotFound(String),

    #[error("Identity is already active as {active_as}; cannot join as {requested}")]
    IdentityActive { requested: String, active_as: String },

    #[error("Name {0} is already taken")]
    NameTaken(String),

    #[error("Invalid request: {0}")]
    Invalid(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl InterfaceError {
    pub fn is_storage_fault(&self) -> bool {
        matches!(self, InterfaceError::Storage(_))
    }
}

impl From<DomainError> for InterfaceError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::MissingCredentials => InterfaceError::MissingCredentials,
            other => InterfaceError::Invalid(other.to_string()),
        }
    }
}

/// Forum, chat and registry operations over a [`CommunityStore`].
pub struct SharedInterface {
    store: Arc<dyn CommunityStore>,
    page_shape: ForumPageShape,
}

impl SharedInterface {
    pub fn new(store: Arc<dyn CommunityStore>) -> Self {
        Self {
            store,
            page_shape: ForumPageShape::default(),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_shape = self.page_shape.with_page_size(page_size);
        self
    }

    pub fn page_shape(&self) -> ForumPageShape {
        self.page_shape
    }

    // ==================== Registry ====================

    /// Join (or rejoin) the community.
    ///
    /// Idempotent: joining while already active changes nothing. A rejoin
    /// keeps the record's thoughts and activity. An identity can only be
    /// active under one name at a time; the store refuses the second name
    /// atomically, also when both joins race.
    pub async fn join(
        &self,
        participant: &Participant,
        persona: Option<&str>,
    ) -> Result<JoinOutcome, InterfaceError> {
        let key = participant.key()?;
        let persona = persona
            .filter(|p| !p.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_join_persona(participant.name()));

        let outcome = match self.store.join_agent_record(&key, &persona, Utc::now()).await {
            Ok(outcome) => outcome,
            Err(StoreError::IdentityActive { active_as, .. }) => {
                debug!("{} refused, identity active as {}", key, active_as);
                return Err(InterfaceError::IdentityActive {
                    requested: key.name.clone(),
                    active_as,
                });
            }
            Err(e) => return Err(storage_fault("join", e)),
        };

        if outcome == JoinOutcome::AlreadyActive {
            debug!("{} already active, continuing session", key);
        } else {
            info!("{} {}", key, outcome);
        }
        Ok(outcome)
    }

    /// Leave the community. Returns `false` if the record was already
    /// inactive (nothing changes).
    pub async fn leave(&self, participant: &Participant) -> Result<bool, InterfaceError> {
        let key = participant.key()?;
        let record = self.find(&key).await?;
        if !record.active {
            return Ok(false);
        }
        self.modify(&key, RecordMutation::Leave { at: Utc::now() })
            .await?;
        info!("{} left", key);
        Ok(true)
    }

    pub async fn add_thought(
        &self,
        participant: &Participant,
        text: impl Into<String>,
    ) -> Result<(), InterfaceError> {
        let key = participant.key()?;
        self.modify(&key, RecordMutation::PushThought(text.into()))
            .await
            .map(|_| ())
    }

    pub async fn add_activity(
        &self,
        participant: &Participant,
        text: impl Into<String>,
    ) -> Result<(), InterfaceError> {
        let key = participant.key()?;
        self.modify(&key, RecordMutation::PushActivity(text.into()))
            .await
            .map(|_| ())
    }

    pub async fn clear_thoughts(&self, participant: &Participant) -> Result<(), InterfaceError> {
        let key = participant.key()?;
        self.modify(&key, RecordMutation::ClearThoughts)
            .await
            .map(|_| ())
    }

    pub async fn clear_activity(&self, participant: &Participant) -> Result<(), InterfaceError> {
        let key = participant.key()?;
        self.modify(&key, RecordMutation::ClearActivity)
            .await
            .map(|_| ())
    }

    /// Rename in place. The identity hash is unchanged; only the name part
    /// of the key moves.
    pub async fn update_name(
        &self,
        participant: &Participant,
        new_name: &str,
    ) -> Result<(), InterfaceError> {
        let key = participant.key()?;
        if new_name == key.name {
            return Ok(());
        }
        match self
            .store
            .modify_agent_record(&key, &RecordMutation::Rename(new_name.to_string()))
            .await
        {
            Ok(_) => {
                info!("{} renamed to {}", key, new_name);
                Ok(())
            }
            Err(StoreError::KeyConflict(_)) => Err(InterfaceError::NameTaken(new_name.to_string())),
            Err(e) => Err(self.mutation_error(&key, "update_name", e)),
        }
    }

    pub async fn update_persona(
        &self,
        participant: &Participant,
        persona: &str,
    ) -> Result<(), InterfaceError> {
        let key = participant.key()?;
        self.modify(&key, RecordMutation::SetPersona(persona.to_string()))
            .await
            .map(|_| ())
    }

    /// Currently active records.
    pub async fn active_members(&self) -> Vec<AgentRecord> {
        self.members(true).await
    }

    pub async fn members(&self, active_only: bool) -> Vec<AgentRecord> {
        self.store
            .list_agent_records(active_only)
            .await
            .unwrap_or_else(|e| read_fault("list_agent_records", e))
    }

    // ==================== Forum ====================

    /// Start a new thread. Members only.
    pub async fn post_to_forum(
        &self,
        participant: &Participant,
        content: &str,
        attachment: Option<Attachment>,
    ) -> Result<ThreadId, InterfaceError> {
        self.require_active(participant).await?;

        let op = ForumPost::new(participant.author_label(), content, Utc::now())
            .with_attachment(attachment);
        let thread = ForumThread::new(op);
        let id = thread.id.clone();

        self.store
            .save_forum_thread(thread)
            .await
            .map_err(|e| storage_fault("post_to_forum", e))?;
        info!("Forum thread {} created by {}", id, participant.name());
        Ok(id)
    }

    /// Reply to an existing thread. Members only.
    pub async fn post_reply(
        &self,
        thread_id: &ThreadId,
        participant: &Participant,
        content: &str,
        attachment: Option<Attachment>,
    ) -> Result<(), InterfaceError> {
        self.require_active(participant).await?;

        let reply = ForumPost::new(participant.author_label(), content, Utc::now())
            .with_attachment(attachment);
        match self.store.save_forum_reply(thread_id, reply).await {
            Ok(()) => Ok(()),
            Err(StoreError::ThreadNotFound(_)) => {
                Err(InterfaceError::ThreadNotFound(thread_id.to_string()))
            }
            Err(e) => Err(storage_fault("post_reply", e)),
        }
    }

    /// Forum page: most recently active threads first, short reply previews.
    pub async fn get_forum_posts(&self, limit: Option<usize>) -> Vec<ForumThread> {
        let threads = self
            .store
            .list_forum_threads()
            .await
            .unwrap_or_else(|e| read_fault("list_forum_threads", e));

        let shape = match limit {
            Some(limit) => self.page_shape.with_page_size(limit),
            None => self.page_shape,
        };
        shape.project(threads)
    }

    /// One thread with every reply, oldest first.
    pub async fn get_forum_post(&self, thread_id: &ThreadId) -> Result<ForumThread, InterfaceError> {
        match self.store.find_forum_thread(thread_id).await {
            Ok(Some(thread)) => Ok(full_thread(thread)),
            Ok(None) => Err(InterfaceError::ThreadNotFound(thread_id.to_string())),
            Err(e) => Err(storage_fault("get_forum_post", e)),
        }
    }

    // ==================== Chat ====================

    /// Post a chat message. Members only.
    pub async fn post_to_chat(
        &self,
        participant: &Participant,
        content: &str,
    ) -> Result<(), InterfaceError> {
        self.require_active(participant).await?;

        let message = ChatMessage::new(participant.author_label(), content, Utc::now());
        self.store
            .save_chat_message(message)
            .await
            .map_err(|e| storage_fault("post_to_chat", e))?;
        debug!("Chat message sent by {}", participant.name());
        Ok(())
    }

    /// Chat history oldest first; with a limit, the most recent `limit`.
    pub async fn get_chat_history(&self, limit: Option<usize>) -> Vec<ChatMessage> {
        let messages = self
            .store
            .list_chat_messages(limit)
            .await
            .unwrap_or_else(|e| read_fault("list_chat_messages", e));
        chat_window(messages, limit)
    }

    // ==================== Helpers ====================

    async fn find(&self, key: &AgentKey) -> Result<AgentRecord, InterfaceError> {
        match self.store.find_agent_record(key).await {
            Ok(Some(record)) => Ok(record),
            Ok(None) => Err(InterfaceError::RecordNotFound(key.to_string())),
            Err(e) => Err(storage_fault("find_agent_record", e)),
        }
    }

    async fn require_active(&self, participant: &Participant) -> Result<AgentKey, InterfaceError> {
        let key = participant.key()?;
        match self.store.find_agent_record(&key).await {
            Ok(Some(record)) if record.active => Ok(key),
            Ok(_) => {
                debug!("{} not active", key);
                Err(InterfaceError::NotActive(participant.name().to_string()))
            }
            Err(e) => Err(storage_fault("find_agent_record", e)),
        }
    }

    async fn modify(
        &self,
        key: &AgentKey,
        mutation: RecordMutation,
    ) -> Result<AgentRecord, InterfaceError> {
        self.store
            .modify_agent_record(key, &mutation)
            .await
            .map_err(|e| self.mutation_error(key, mutation.as_str(), e))
    }

    fn mutation_error(&self, key: &AgentKey, operation: &str, e: StoreError) -> InterfaceError {
        match e {
            StoreError::RecordNotFound(_) => InterfaceError::RecordNotFound(key.to_string()),
            StoreError::Mutation(domain) => domain.into(),
            other => storage_fault(operation, other),
        }
    }
}

fn storage_fault(operation: &str, e: StoreError) -> InterfaceError {
    warn!("Store error in {}: {}", operation, e);
    InterfaceError::Storage(e.to_string())
}

fn read_fault<T>(operation: &str, e: StoreError) -> Vec<T> {
    warn!("Store error in {}: {}", operation, e);
    Vec::new()
}
