//! SQLite community store.
//!
//! Records are stored as JSON next to their key columns and a `version`
//! column. A mutation reads the record, applies the change in memory and
//! writes it back with `UPDATE ... WHERE version = ?`; when another writer
//! got there first the update touches no row and the mutation is retried on
//! a fresh read.
//!
//! A partial unique index on `identity WHERE active = 1` keeps an identity
//! active under one name; whichever statement would activate a second name
//! fails inside SQLite and is reported as [`StoreError::IdentityActive`].

use async_trait::async_trait;
use polis_application::ports::community_store::{CommunityStore, StoreError};
use polis_domain::{
    AgentKey, AgentRecord, ChatMessage, ForumPost, ForumThread, RecordMutation, ThreadId,
};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Attempts for one versioned update before giving up with
/// [`StoreError::Contention`].
const MAX_WRITE_ATTEMPTS: usize = 16;

/// [`CommunityStore`] backed by a SQLite database.
pub struct SqliteCommunityStore {
    pool: SqlitePool,
}

impl SqliteCommunityStore {
    /// Open (or create) the database at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Backend(format!("Failed to create database directory: {}", e))
            })?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .map_err(backend)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(backend)?;

        let store = Self { pool };
        store.init_schema().await?;
        info!("SQLite community store opened at {}", path.display());
        Ok(store)
    }

    /// A private in-memory database. A single connection keeps every query
    /// on the same database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(backend)?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS agent_records (
                identity TEXT NOT NULL,
                name TEXT NOT NULL,
                active INTEGER NOT NULL,
                version INTEGER NOT NULL,
                record_json TEXT NOT NULL,
                PRIMARY KEY (identity, name)
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_one_active_name
                ON agent_records(identity) WHERE active = 1;

            CREATE TABLE IF NOT EXISTS forum_threads (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                op_json TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS forum_replies (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                thread_id TEXT NOT NULL,
                post_json TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_replies_thread ON forum_replies(thread_id);

            CREATE TABLE IF NOT EXISTS chat_messages (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                message_json TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        debug!("SQLite community schema initialized");
        Ok(())
    }

    async fn load_record(&self, key: &AgentKey) -> Result<Option<AgentRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT record_json FROM agent_records WHERE identity = ? AND name = ?",
        )
        .bind(key.identity.as_str())
        .bind(&key.name)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(|row| from_json(&row.get::<String, _>("record_json")))
            .transpose()
    }

    /// The error for a write that tripped the one-active-name index.
    async fn identity_active(&self, key: &AgentKey) -> StoreError {
        let active_as = sqlx::query(
            "SELECT name FROM agent_records WHERE identity = ? AND active = 1 AND name <> ?",
        )
        .bind(key.identity.as_str())
        .bind(&key.name)
        .fetch_optional(&self.pool)
        .await
        .ok()
        .flatten()
        .map(|row| row.get::<String, _>("name"))
        .unwrap_or_else(|| "another name".to_string());

        StoreError::IdentityActive {
            requested: key.name.clone(),
            active_as,
        }
    }

    async fn load_replies(&self) -> Result<HashMap<String, Vec<ForumPost>>, StoreError> {
        let rows = sqlx::query("SELECT thread_id, post_json FROM forum_replies ORDER BY seq")
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;

        let mut replies: HashMap<String, Vec<ForumPost>> = HashMap::new();
        for row in rows {
            let post = from_json(&row.get::<String, _>("post_json"))?;
            replies
                .entry(row.get::<String, _>("thread_id"))
                .or_default()
                .push(post);
        }
        Ok(replies)
    }
}

#[async_trait]
impl CommunityStore for SqliteCommunityStore {
    async fn save_agent_record(&self, record: AgentRecord) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO agent_records (identity, name, active, version, record_json)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.identity.as_str())
        .bind(&record.name)
        .bind(record.active)
        .bind(record.version as i64)
        .bind(to_json(&record)?)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => {
                let key = record.key();
                if self.load_record(&key).await?.is_some() {
                    Err(StoreError::KeyConflict(key.to_string()))
                } else {
                    Err(self.identity_active(&key).await)
                }
            }
            Err(e) => Err(backend(e)),
        }
    }

    async fn find_agent_record(&self, key: &AgentKey) -> Result<Option<AgentRecord>, StoreError> {
        self.load_record(key).await
    }

    async fn list_agent_records(&self, active_only: bool) -> Result<Vec<AgentRecord>, StoreError> {
        let sql = if active_only {
            "SELECT record_json FROM agent_records WHERE active = 1 ORDER BY rowid"
        } else {
            "SELECT record_json FROM agent_records ORDER BY rowid"
        };
        let rows = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;

        rows.iter()
            .map(|row| from_json(&row.get::<String, _>("record_json")))
            .collect()
    }

    async fn modify_agent_record(
        &self,
        key: &AgentKey,
        mutation: &RecordMutation,
    ) -> Result<AgentRecord, StoreError> {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let current = self
                .load_record(key)
                .await?
                .ok_or_else(|| StoreError::RecordNotFound(key.to_string()))?;
            let expected_version = current.version;

            let mut updated = current;
            mutation.apply(&mut updated)?;

            let result = sqlx::query(
                r#"
                UPDATE agent_records
                SET name = ?, active = ?, version = ?, record_json = ?
                WHERE identity = ? AND name = ? AND version = ?
                "#,
            )
            .bind(&updated.name)
            .bind(updated.active)
            .bind(updated.version as i64)
            .bind(to_json(&updated)?)
            .bind(key.identity.as_str())
            .bind(&key.name)
            .bind(expected_version as i64)
            .execute(&self.pool)
            .await;

            match result {
                Ok(done) if done.rows_affected() == 1 => return Ok(updated),
                Ok(_) => {
                    debug!(
                        "Version conflict on {} ({}), attempt {}",
                        key, mutation, attempt
                    );
                }
                Err(e) if is_unique_violation(&e) && mutation.activates() => {
                    return Err(self.identity_active(key).await);
                }
                Err(e) if is_unique_violation(&e) => {
                    return Err(StoreError::KeyConflict(
                        key.renamed(updated.name.clone()).to_string(),
                    ));
                }
                Err(e) => return Err(backend(e)),
            }
        }

        Err(StoreError::Contention(key.to_string()))
    }

    async fn save_forum_thread(&self, thread: ForumThread) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        sqlx::query("INSERT INTO forum_threads (id, op_json) VALUES (?, ?)")
            .bind(thread.id.as_str())
            .bind(to_json(&thread.op)?)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        for reply in &thread.replies {
            sqlx::query("INSERT INTO forum_replies (thread_id, post_json) VALUES (?, ?)")
                .bind(thread.id.as_str())
                .bind(to_json(reply)?)
                .execute(&mut *tx)
                .await
                .map_err(backend)?;
        }

        tx.commit().await.map_err(backend)
    }

    async fn save_forum_reply(
        &self,
        thread_id: &ThreadId,
        reply: ForumPost,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO forum_replies (thread_id, post_json)
            SELECT id, ? FROM forum_threads WHERE id = ?
            "#,
        )
        .bind(to_json(&reply)?)
        .bind(thread_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::ThreadNotFound(thread_id.to_string()));
        }
        Ok(())
    }

    async fn list_forum_threads(&self) -> Result<Vec<ForumThread>, StoreError> {
        let rows = sqlx::query("SELECT id, op_json FROM forum_threads ORDER BY seq")
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        let mut replies = self.load_replies().await?;

        rows.iter()
            .map(|row| {
                let id: String = row.get("id");
                let replies = replies.remove(&id).unwrap_or_default();
                build_thread(id, &row.get::<String, _>("op_json"), replies)
            })
            .collect()
    }

    async fn find_forum_thread(&self, id: &ThreadId) -> Result<Option<ForumThread>, StoreError> {
        let Some(row) = sqlx::query("SELECT op_json FROM forum_threads WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?
        else {
            return Ok(None);
        };

        let reply_rows =
            sqlx::query("SELECT post_json FROM forum_replies WHERE thread_id = ? ORDER BY seq")
                .bind(id.as_str())
                .fetch_all(&self.pool)
                .await
                .map_err(backend)?;
        let replies = reply_rows
            .iter()
            .map(|r| from_json(&r.get::<String, _>("post_json")))
            .collect::<Result<Vec<ForumPost>, _>>()?;

        build_thread(id.to_string(), &row.get::<String, _>("op_json"), replies).map(Some)
    }

    async fn save_chat_message(&self, message: ChatMessage) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO chat_messages (message_json) VALUES (?)")
            .bind(to_json(&message)?)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn list_chat_messages(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        // A negative LIMIT means no limit in SQLite.
        let limit = limit.map_or(-1, |l| l as i64);
        let rows = sqlx::query(
            r#"
            SELECT message_json FROM (
                SELECT seq, message_json FROM chat_messages ORDER BY seq DESC LIMIT ?
            ) ORDER BY seq ASC
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.iter()
            .map(|row| from_json(&row.get::<String, _>("message_json")))
            .collect()
    }

    async fn clear_all(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            DELETE FROM agent_records;
            DELETE FROM forum_replies;
            DELETE FROM forum_threads;
            DELETE FROM chat_messages;
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        info!("Community store cleared");
        Ok(())
    }
}

fn build_thread(id: String, op_json: &str, replies: Vec<ForumPost>) -> Result<ForumThread, StoreError> {
    let mut thread = ForumThread {
        id: ThreadId::new(id),
        op: from_json(op_json)?,
        replies: Vec::with_capacity(replies.len()),
    };
    for reply in replies {
        thread.add_reply(reply);
    }
    Ok(thread)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn from_json<T: serde::de::DeserializeOwned>(json: &str) -> Result<T, StoreError> {
    serde_json::from_str(json).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}
