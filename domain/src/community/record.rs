//! Registry records and the atomic mutations applied to them.
//!
//! Stores never replace a whole [`AgentRecord`] on behalf of a caller that
//! read it earlier. Instead callers describe the change as a
//! [`RecordMutation`] and the store applies it inside its own critical
//! section (or versioned write), so two writers touching the same record
//! cannot lose each other's updates.

use super::history::BoundedHistory;
use crate::core::error::DomainError;
use crate::identity::{AgentKey, IdentityHash};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted projection of an agent's membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub identity: IdentityHash,
    pub name: String,
    pub persona: String,
    #[serde(default)]
    pub thoughts: BoundedHistory,
    #[serde(default)]
    pub activity: BoundedHistory,
    pub active: bool,
    pub joined_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_at: Option<DateTime<Utc>>,
    /// Bumped on every applied mutation; used for versioned writes.
    #[serde(default)]
    pub version: u64,
}

impl AgentRecord {
    /// A freshly joined, active record.
    pub fn joined(key: &AgentKey, persona: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            identity: key.identity.clone(),
            name: key.name.clone(),
            persona: persona.into(),
            thoughts: BoundedHistory::new(),
            activity: BoundedHistory::new(),
            active: true,
            joined_at: at,
            left_at: None,
            version: 0,
        }
    }

    pub fn key(&self) -> AgentKey {
        AgentKey::new(self.identity.clone(), self.name.clone())
    }

    pub fn matches(&self, key: &AgentKey) -> bool {
        self.identity == key.identity && self.name == key.name
    }
}

/// The record of `key`'s identity that is active under a different name.
///
/// Stores check this inside the same critical section that activates a
/// record, so an identity is never active under two names.
pub fn active_alias<'a>(
    records: impl IntoIterator<Item = &'a AgentRecord>,
    key: &AgentKey,
) -> Option<&'a AgentRecord> {
    records
        .into_iter()
        .find(|r| r.active && r.identity == key.identity && r.name != key.name)
}

/// A single field-level change to an [`AgentRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordMutation {
    /// Reactivate an existing record; thoughts and activity are kept.
    Rejoin { persona: String, at: DateTime<Utc> },
    Leave { at: DateTime<Utc> },
    PushThought(String),
    PushActivity(String),
    ClearThoughts,
    ClearActivity,
    /// Change the name component of the key.
    Rename(String),
    SetPersona(String),
}

impl RecordMutation {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordMutation::Rejoin { .. } => "rejoin",
            RecordMutation::Leave { .. } => "leave",
            RecordMutation::PushThought(_) => "push_thought",
            RecordMutation::PushActivity(_) => "push_activity",
            RecordMutation::ClearThoughts => "clear_thoughts",
            RecordMutation::ClearActivity => "clear_activity",
            RecordMutation::Rename(_) => "rename",
            RecordMutation::SetPersona(_) => "set_persona",
        }
    }

    /// Name the record will carry after this mutation, if it changes.
    pub fn new_name(&self) -> Option<&str> {
        match self {
            RecordMutation::Rename(name) => Some(name),
            _ => None,
        }
    }

    /// Whether applying this mutation makes the record active.
    pub fn activates(&self) -> bool {
        matches!(self, RecordMutation::Rejoin { .. })
    }

    /// Apply the mutation in place and bump the record version.
    pub fn apply(&self, record: &mut AgentRecord) -> Result<(), DomainError> {
        match self {
            RecordMutation::Rejoin { persona, at } => {
                record.persona = persona.clone();
                record.active = true;
                record.joined_at = *at;
                record.left_at = None;
            }
            RecordMutation::Leave { at } => {
                record.active = false;
                record.left_at = Some(*at);
            }
            RecordMutation::PushThought(text) => record.thoughts.push(text.clone()),
            RecordMutation::PushActivity(text) => record.activity.push(text.clone()),
            RecordMutation::ClearThoughts => record.thoughts.clear(),
            RecordMutation::ClearActivity => record.activity.clear(),
            RecordMutation::Rename(name) => {
                if name.trim().is_empty() {
                    return Err(DomainError::EmptyName);
                }
                record.name = name.clone();
            }
            RecordMutation::SetPersona(persona) => record.persona = persona.clone(),
        }
        record.version += 1;
        Ok(())
    }
}

impl std::fmt::Display for RecordMutation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
