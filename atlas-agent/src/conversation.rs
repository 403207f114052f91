//! Conversation CRUD store (spec §4.1, §6.3) — independent of the checkpoint store.
//!
//! A `Conversation` is a thread-level record (title, timestamps); it lives in
//! its own namespace and is never touched by checkpoint deletion or vice versa.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::Connection;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conversation {
    pub id: String,
    pub session_id: String,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConversationError {
    #[error("storage error: {0}")]
    Storage(String),
}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Idempotent: a duplicate `create` for an existing `thread_id` returns the
    /// existing row unchanged (spec §8 round-trip property).
    async fn create(
        &self,
        thread_id: &str,
        session_id: &str,
        title: Option<String>,
    ) -> Result<Conversation, ConversationError>;

    async fn list_by_session(&self, session_id: &str) -> Result<Vec<Conversation>, ConversationError>;

    async fn get(&self, thread_id: &str) -> Result<Option<Conversation>, ConversationError>;

    /// No-op if `thread_id` is absent.
    async fn delete(&self, thread_id: &str) -> Result<(), ConversationError>;

    async fn update_timestamp(&self, thread_id: &str) -> Result<(), ConversationError>;
}

/// Takes the first sentence (delimited by `.`, `!`, or `?`); if still longer than
/// `max_len`, truncates on the last word boundary before `max_len - 3` and
/// suffixes with `...`. Empty or whitespace-only input is returned unchanged.
pub fn derive_title(message: &str, max_len: usize) -> String {
    if message.trim().is_empty() {
        return message.to_string();
    }
    let first_sentence = message
        .find(['.', '!', '?'])
        .map(|idx| &message[..=idx])
        .unwrap_or(message)
        .trim()
        .to_string();

    if first_sentence.chars().count() <= max_len {
        return first_sentence;
    }
    if max_len < 4 {
        return first_sentence.chars().take(max_len).collect();
    }
    let budget = max_len - 3;
    let mut truncated = String::new();
    for word in first_sentence.split_whitespace() {
        let candidate_len = if truncated.is_empty() {
            word.chars().count()
        } else {
            truncated.chars().count() + 1 + word.chars().count()
        };
        if candidate_len > budget {
            break;
        }
        if !truncated.is_empty() {
            truncated.push(' ');
        }
        truncated.push_str(word);
    }
    if truncated.is_empty() {
        truncated = first_sentence.chars().take(budget).collect();
    }
    format!("{truncated}...")
}

/// In-memory conversation store (test/dev).
#[derive(Default)]
pub struct MemoryConversationStore {
    rows: Mutex<HashMap<String, Conversation>>,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn create(
        &self,
        thread_id: &str,
        session_id: &str,
        title: Option<String>,
    ) -> Result<Conversation, ConversationError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(existing) = rows.get(thread_id) {
            return Ok(existing.clone());
        }
        let now = Utc::now();
        let conversation = Conversation {
            id: thread_id.to_string(),
            session_id: session_id.to_string(),
            title,
            created_at: now,
            updated_at: now,
        };
        rows.insert(thread_id.to_string(), conversation.clone());
        Ok(conversation)
    }

    async fn list_by_session(&self, session_id: &str) -> Result<Vec<Conversation>, ConversationError> {
        let rows = self.rows.lock().unwrap();
        let mut matches: Vec<Conversation> = rows
            .values()
            .filter(|c| c.session_id == session_id)
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(matches)
    }

    async fn get(&self, thread_id: &str) -> Result<Option<Conversation>, ConversationError> {
        Ok(self.rows.lock().unwrap().get(thread_id).cloned())
    }

    async fn delete(&self, thread_id: &str) -> Result<(), ConversationError> {
        self.rows.lock().unwrap().remove(thread_id);
        Ok(())
    }

    async fn update_timestamp(&self, thread_id: &str) -> Result<(), ConversationError> {
        if let Some(row) = self.rows.lock().unwrap().get_mut(thread_id) {
            row.updated_at = Utc::now();
        }
        Ok(())
    }
}

/// SQLite-backed conversation store. Schema per spec §6.3:
/// `conversations(id PK, session_id, title, created_at, updated_at)`
/// with indices on `session_id` and `updated_at DESC`.
pub struct SqliteConversationStore {
    conn: Mutex<Connection>,
}

impl SqliteConversationStore {
    pub fn new(path: &str) -> Result<Self, ConversationError> {
        let conn = Connection::open(path).map_err(|e| ConversationError::Storage(e.to_string()))?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS conversations (
                id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL,
                title TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_conversations_session ON conversations(session_id);
            CREATE INDEX IF NOT EXISTS idx_conversations_updated ON conversations(updated_at DESC);",
        )
        .map_err(|e| ConversationError::Storage(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn row_to_conversation(row: &rusqlite::Row) -> rusqlite::Result<Conversation> {
        let created_at: String = row.get(3)?;
        let updated_at: String = row.get(4)?;
        Ok(Conversation {
            id: row.get(0)?,
            session_id: row.get(1)?,
            title: row.get(2)?,
            created_at: DateTime::parse_from_rfc3339(&created_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            updated_at: DateTime::parse_from_rfc3339(&updated_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}

#[async_trait]
impl ConversationStore for SqliteConversationStore {
    async fn create(
        &self,
        thread_id: &str,
        session_id: &str,
        title: Option<String>,
    ) -> Result<Conversation, ConversationError> {
        if let Some(existing) = self.get(thread_id).await? {
            return Ok(existing);
        }
        let now = Utc::now();
        let conversation = Conversation {
            id: thread_id.to_string(),
            session_id: session_id.to_string(),
            title,
            created_at: now,
            updated_at: now,
        };
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO conversations (id, session_id, title, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO NOTHING",
            rusqlite::params![
                conversation.id,
                conversation.session_id,
                conversation.title,
                conversation.created_at.to_rfc3339(),
                conversation.updated_at.to_rfc3339(),
            ],
        )
        .map_err(|e| ConversationError::Storage(e.to_string()))?;
        Ok(conversation)
    }

    async fn list_by_session(&self, session_id: &str) -> Result<Vec<Conversation>, ConversationError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT id, session_id, title, created_at, updated_at FROM conversations
                 WHERE session_id = ?1 ORDER BY updated_at DESC",
            )
            .map_err(|e| ConversationError::Storage(e.to_string()))?;
        let rows = stmt
            .query_map([session_id], Self::row_to_conversation)
            .map_err(|e| ConversationError::Storage(e.to_string()))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(|e| ConversationError::Storage(e.to_string()))?);
        }
        Ok(out)
    }

    async fn get(&self, thread_id: &str) -> Result<Option<Conversation>, ConversationError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, session_id, title, created_at, updated_at FROM conversations WHERE id = ?1",
            [thread_id],
            Self::row_to_conversation,
        )
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(ConversationError::Storage(other.to_string())),
        })
    }

    async fn delete(&self, thread_id: &str) -> Result<(), ConversationError> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM conversations WHERE id = ?1", [thread_id])
            .map_err(|e| ConversationError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn update_timestamp(&self, thread_id: &str) -> Result<(), ConversationError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE conversations SET updated_at = ?1 WHERE id = ?2",
            rusqlite::params![Utc::now().to_rfc3339(), thread_id],
        )
        .map_err(|e| ConversationError::Storage(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_title_takes_first_sentence() {
        assert_eq!(
            derive_title("What is the ECI? And how is it computed?", 50),
            "What is the ECI?"
        );
    }

    #[test]
    fn derive_title_truncates_on_word_boundary() {
        let long = "This is a very long question about trade data classification systems and their history";
        let title = derive_title(long, 30);
        assert!(title.chars().count() <= 30);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn derive_title_leaves_empty_input_unchanged() {
        assert_eq!(derive_title("", 50), "");
        assert_eq!(derive_title("   ", 50), "   ");
    }

    #[test]
    fn derive_title_length_never_exceeds_max_len() {
        for max_len in [4usize, 10, 20, 50] {
            let s = "aaaaaaaaaa bbbbbbbbbb cccccccccc dddddddddd eeeeeeeeee";
            assert!(derive_title(s, max_len).chars().count() <= max_len);
        }
    }

    #[tokio::test]
    async fn create_is_idempotent_and_does_not_overwrite_title() {
        let store = MemoryConversationStore::new();
        let first = store.create("t1", "s1", Some("A".into())).await.unwrap();
        let second = store.create("t1", "s1", Some("B".into())).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(second.title.as_deref(), Some("A"));
    }

    #[tokio::test]
    async fn delete_missing_is_noop() {
        let store = MemoryConversationStore::new();
        store.delete("missing").await.unwrap();
    }

    #[tokio::test]
    async fn list_by_session_orders_by_updated_at_desc() {
        let store = MemoryConversationStore::new();
        store.create("t1", "s1", None).await.unwrap();
        store.create("t2", "s1", None).await.unwrap();
        store.update_timestamp("t1").await.unwrap();
        let list = store.list_by_session("s1").await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, "t1");
    }
}
