//! Forum and chat entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque unique thread identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(String);

impl ThreadId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random (UUID v4) id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ThreadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata of an opaque file blob. Contents are never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub media_type: String,
    pub size: u64,
}

impl Attachment {
    /// Metadata for a file served from the uploads area.
    pub fn uploaded(name: impl Into<String>, size: u64) -> Self {
        let name = name.into();
        Self {
            url: format!("{}{}", UPLOADS_URL_PREFIX, name),
            media_type: media_type_for(&name).to_string(),
            name,
            size,
        }
    }
}

/// URL prefix under which uploaded files are exposed.
pub const UPLOADS_URL_PREFIX: &str = "/uploads/";

/// Media type derived from a file name's extension.
pub fn media_type_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// An originating post or a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumPost {
    pub author: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
}

impl ForumPost {
    pub fn new(author: impl Into<String>, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            author: author.into(),
            content: content.into(),
            timestamp,
            attachment: None,
        }
    }

    pub fn with_attachment(mut self, attachment: Option<Attachment>) -> Self {
        self.attachment = attachment;
        self
    }
}

/// A forum thread. The id and originating post never change once created;
/// only the reply list grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumThread {
    #[serde(rename = "threadId")]
    pub id: ThreadId,
    pub op: ForumPost,
    #[serde(default)]
    pub replies: Vec<ForumPost>,
}

impl ForumThread {
    pub fn new(op: ForumPost) -> Self {
        Self {
            id: ThreadId::generate(),
            op,
            replies: Vec::new(),
        }
    }

    /// Insert a reply keeping replies ordered by timestamp. Replies with
    /// equal timestamps stay in arrival order.
    pub fn add_reply(&mut self, reply: ForumPost) {
        let position = self
            .replies
            .partition_point(|existing| existing.timestamp <= reply.timestamp);
        self.replies.insert(position, reply);
    }

    /// Max of the originating post and all reply timestamps.
    pub fn latest_activity(&self) -> DateTime<Utc> {
        self.replies
            .iter()
            .map(|r| r.timestamp)
            .fold(self.op.timestamp, |latest, ts| latest.max(ts))
    }
}

/// A chat room message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: String,
    #[serde(rename = "message")]
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(sender: impl Into<String>, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            sender: sender.into(),
            content: content.into(),
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_media_type_mapping() {
        assert_eq!(media_type_for("a.PNG"), "image/png");
        assert_eq!(media_type_for("photo.jpeg"), "image/jpeg");
        assert_eq!(media_type_for("notes.txt"), "text/plain");
        assert_eq!(media_type_for("archive.tar.gz"), "application/octet-stream");
        assert_eq!(media_type_for("README"), "application/octet-stream");
    }

    #[test]
    fn test_uploaded_attachment() {
        let a = Attachment::uploaded("poem.txt", 12);
        assert_eq!(a.url, "/uploads/poem.txt");
        assert_eq!(a.media_type, "text/plain");
        assert_eq!(a.size, 12);
    }

    #[test]
    fn test_replies_stay_sorted_by_timestamp() {
        let t0 = Utc::now();
        let mut thread = ForumThread::new(ForumPost::new("[Agent] A", "op", t0));
        thread.add_reply(ForumPost::new("b", "late", t0 + Duration::seconds(10)));
        thread.add_reply(ForumPost::new("c", "early", t0 + Duration::seconds(5)));
        thread.add_reply(ForumPost::new("d", "late-tie", t0 + Duration::seconds(10)));

        let contents: Vec<_> = thread.replies.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(contents, vec!["early", "late", "late-tie"]);
        assert_eq!(thread.latest_activity(), t0 + Duration::seconds(10));
    }

    #[test]
    fn test_latest_activity_without_replies() {
        let t0 = Utc::now();
        let thread = ForumThread::new(ForumPost::new("a", "op", t0));
        assert_eq!(thread.latest_activity(), t0);
    }

    #[test]
    fn test_thread_json_shape() {
        let t0 = Utc::now();
        let thread = ForumThread::new(ForumPost::new("a", "op", t0));
        let json = serde_json::to_value(&thread).unwrap();
        assert!(json.get("threadId").is_some());
        assert_eq!(json["op"]["content"], "op");
        assert!(json["op"].get("attachment").is_none());
    }
}
