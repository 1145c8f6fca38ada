//! Read-side projections of forum and chat state.
//!
//! These functions take owned copies of stored data and never write back,
//! so a projection can be recomputed on every read.

use super::forum::{ChatMessage, ForumPost, ForumThread};
use crate::core::string::truncate_chars;

/// Shape of the forum overview page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForumPageShape {
    /// Maximum number of threads on a page.
    pub page_size: usize,
    /// Replies shown per thread (most recent first).
    pub reply_preview: usize,
    /// Content longer than this many characters is truncated.
    pub content_limit: usize,
}

impl Default for ForumPageShape {
    fn default() -> Self {
        Self {
            page_size: 20,
            reply_preview: 2,
            content_limit: 300,
        }
    }
}

impl ForumPageShape {
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Threads ordered by most recent activity (descending), each with its
    /// newest replies first and long bodies truncated.
    pub fn project(&self, mut threads: Vec<ForumThread>) -> Vec<ForumThread> {
        threads.sort_by_key(|t| std::cmp::Reverse(t.latest_activity()));
        threads.truncate(self.page_size);

        threads
            .into_iter()
            .map(|mut thread| {
                // Stable ascending sort keeps arrival order among equal
                // timestamps; reversing puts the latest arrival first.
                thread.replies.sort_by_key(|r| r.timestamp);
                thread.replies.reverse();
                thread.replies.truncate(self.reply_preview);
                self.shorten(&mut thread.op);
                for reply in &mut thread.replies {
                    self.shorten(reply);
                }
                thread
            })
            .collect()
    }

    fn shorten(&self, post: &mut ForumPost) {
        post.content = truncate_chars(&post.content, self.content_limit);
    }
}

/// Full thread view: replies oldest first, nothing truncated.
pub fn full_thread(mut thread: ForumThread) -> ForumThread {
    thread.replies.sort_by_key(|r| r.timestamp);
    thread
}

/// Chat history in chronological order, optionally only the last `limit`.
pub fn chat_window(mut messages: Vec<ChatMessage>, limit: Option<usize>) -> Vec<ChatMessage> {
    messages.sort_by_key(|m| m.timestamp);
    if let Some(limit) = limit {
        let skip = messages.len().saturating_sub(limit);
        messages.drain(..skip);
    }
    messages
}
