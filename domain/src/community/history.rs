//! FIFO-capped history used for a member's thoughts and activity.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Maximum number of entries kept in a thoughts or activity history.
pub const HISTORY_CAPACITY: usize = 5;

/// Bounded FIFO list of short strings. Pushing past
/// [`HISTORY_CAPACITY`] evicts the oldest entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoundedHistory {
    entries: VecDeque<String>,
}

impl BoundedHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from stored entries, keeping only the newest ones.
    pub fn from_entries(entries: impl IntoIterator<Item = String>) -> Self {
        let mut history = Self::new();
        for entry in entries {
            history.push(entry);
        }
        history
    }

    pub fn push(&mut self, entry: impl Into<String>) {
        self.entries.push_back(entry.into());
        while self.entries.len() > HISTORY_CAPACITY {
            self.entries.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|s| s.as_str())
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }
}
