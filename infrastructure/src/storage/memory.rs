//! In-memory community store.
//!
//! Everything lives behind one mutex, so each record mutation is applied
//! while the lock is held. Nothing survives the process.

use async_trait::async_trait;
use polis_application::ports::community_store::{CommunityStore, StoreError};
use chrono::{DateTime, Utc};
use polis_domain::{
    AgentKey, AgentRecord, ChatMessage, ForumPost, ForumThread, JoinOutcome, RecordMutation,
    ThreadId, active_alias,
};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Community {
    records: Vec<AgentRecord>,
    threads: Vec<ForumThread>,
    chat: Vec<ChatMessage>,
}

/// [`CommunityStore`] backed by process memory.
#[derive(Default)]
pub struct InMemoryCommunityStore {
    inner: Mutex<Community>,
}

impl InMemoryCommunityStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Community>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Backend("community state lock poisoned".to_string()))
    }
}

impl Community {
    fn check_activation(&self, key: &AgentKey) -> Result<(), StoreError> {
        match active_alias(&self.records, key) {
            Some(alias) => Err(StoreError::IdentityActive {
                requested: key.name.clone(),
                active_as: alias.name.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CommunityStore for InMemoryCommunityStore {
    async fn save_agent_record(&self, record: AgentRecord) -> Result<(), StoreError> {
        let mut community = self.lock()?;
        let key = record.key();
        if community.records.iter().any(|r| r.matches(&key)) {
            return Err(StoreError::KeyConflict(key.to_string()));
        }
        if record.active {
            community.check_activation(&key)?;
        }
        community.records.push(record);
        Ok(())
    }

    async fn find_agent_record(&self, key: &AgentKey) -> Result<Option<AgentRecord>, StoreError> {
        let community = self.lock()?;
        Ok(community.records.iter().find(|r| r.matches(key)).cloned())
    }

    async fn list_agent_records(&self, active_only: bool) -> Result<Vec<AgentRecord>, StoreError> {
        let community = self.lock()?;
        Ok(community
            .records
            .iter()
            .filter(|r| r.active || !active_only)
            .cloned()
            .collect())
    }

    async fn modify_agent_record(
        &self,
        key: &AgentKey,
        mutation: &RecordMutation,
    ) -> Result<AgentRecord, StoreError> {
        let mut community = self.lock()?;

        if mutation.activates() {
            community.check_activation(key)?;
        }
        if let Some(name) = mutation.new_name()
            && name != key.name
        {
            let target = key.renamed(name);
            if community.records.iter().any(|r| r.matches(&target)) {
                return Err(StoreError::KeyConflict(target.to_string()));
            }
        }

        let record = community
            .records
            .iter_mut()
            .find(|r| r.matches(key))
            .ok_or_else(|| StoreError::RecordNotFound(key.to_string()))?;

        // Apply to a copy so a rejected mutation leaves the record as it was.
        let mut updated = record.clone();
        mutation.apply(&mut updated)?;
        *record = updated.clone();
        Ok(updated)
    }

    async fn join_agent_record(
        &self,
        key: &AgentKey,
        persona: &str,
        at: DateTime<Utc>,
    ) -> Result<JoinOutcome, StoreError> {
        let mut community = self.lock()?;

        if let Some(existing) = community.records.iter().find(|r| r.matches(key))
            && existing.active
        {
            return Ok(JoinOutcome::AlreadyActive);
        }
        community.check_activation(key)?;

        match community.records.iter().position(|r| r.matches(key)) {
            Some(index) => {
                RecordMutation::Rejoin {
                    persona: persona.to_string(),
                    at,
                }
                .apply(&mut community.records[index])?;
                Ok(JoinOutcome::Rejoined)
            }
            None => {
                community
                    .records
                    .push(AgentRecord::joined(key, persona, at));
                Ok(JoinOutcome::Joined)
            }
        }
    }

    async fn save_forum_thread(&self, thread: ForumThread) -> Result<(), StoreError> {
        self.lock()?.threads.push(thread);
        Ok(())
    }

    async fn save_forum_reply(
        &self,
        thread_id: &ThreadId,
        reply: ForumPost,
    ) -> Result<(), StoreError> {
        let mut community = self.lock()?;
        let thread = community
            .threads
            .iter_mut()
            .find(|t| &t.id == thread_id)
            .ok_or_else(|| StoreError::ThreadNotFound(thread_id.to_string()))?;
        thread.add_reply(reply);
        Ok(())
    }

    async fn list_forum_threads(&self) -> Result<Vec<ForumThread>, StoreError> {
        Ok(self.lock()?.threads.clone())
    }

    async fn find_forum_thread(&self, id: &ThreadId) -> Result<Option<ForumThread>, StoreError> {
        let community = self.lock()?;
        Ok(community.threads.iter().find(|t| &t.id == id).cloned())
    }

    async fn save_chat_message(&self, message: ChatMessage) -> Result<(), StoreError> {
        self.lock()?.chat.push(message);
        Ok(())
    }

    async fn list_chat_messages(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        let community = self.lock()?;
        let start = limit.map_or(0, |l| community.chat.len().saturating_sub(l));
        Ok(community.chat[start..].to_vec())
    }

    async fn clear_all(&self) -> Result<(), StoreError> {
        *self.lock()? = Community::default();
        Ok(())
    }
}
