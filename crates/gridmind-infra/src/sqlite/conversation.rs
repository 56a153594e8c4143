//! SQLite message store implementation.
//!
//! Implements `MessageStore` from `gridmind-core` using sqlx with split
//! read/write pools: raw queries, private Row structs, reads on the reader
//! pool, writes serialized through the writer pool.

use gridmind_core::conversation::store::MessageStore;
use gridmind_types::agent::AgentKind;
use gridmind_types::conversation::{Conversation, Message, SenderRole};
use gridmind_types::error::StoreError;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `MessageStore`.
pub struct SqliteMessageStore {
    pool: DatabasePool,
}

impl SqliteMessageStore {
    /// Create a new store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

/// Internal row type for mapping SQLite rows to domain Conversation.
struct ConversationRow {
    id: String,
    owner_id: String,
    agent: String,
    title: Option<String>,
    created_at: String,
    updated_at: String,
}

impl ConversationRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            agent: row.try_get("agent")?,
            title: row.try_get("title")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_conversation(self) -> Result<Conversation, StoreError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| StoreError::Query(format!("invalid conversation id: {e}")))?;
        let owner_id = Uuid::parse_str(&self.owner_id)
            .map_err(|e| StoreError::Query(format!("invalid owner_id: {e}")))?;
        let agent: AgentKind = self
            .agent
            .parse()
            .map_err(|e: String| StoreError::Query(e))?;
        let created_at = parse_datetime(&self.created_at)?;
        let updated_at = parse_datetime(&self.updated_at)?;

        Ok(Conversation {
            id,
            owner_id,
            agent,
            title: self.title,
            created_at,
            updated_at,
        })
    }
}

/// Internal row type for mapping SQLite rows to domain Message.
struct MessageRow {
    id: String,
    conversation_id: String,
    role: String,
    content: String,
    created_at: String,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            conversation_id: row.try_get("conversation_id")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<Message, StoreError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| StoreError::Query(format!("invalid message id: {e}")))?;
        let conversation_id = Uuid::parse_str(&self.conversation_id)
            .map_err(|e| StoreError::Query(format!("invalid conversation_id: {e}")))?;
        let role: SenderRole = self
            .role
            .parse()
            .map_err(|e: String| StoreError::Query(e))?;
        let created_at = parse_datetime(&self.created_at)?;

        Ok(Message {
            id,
            conversation_id,
            role,
            content: self.content,
            created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

// ---------------------------------------------------------------------------
// MessageStore implementation
// ---------------------------------------------------------------------------

impl MessageStore for SqliteMessageStore {
    async fn create_conversation(&self, conversation: &Conversation) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO conversations (id, owner_id, agent, title, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(conversation.id.to_string())
        .bind(conversation.owner_id.to_string())
        .bind(conversation.agent.to_string())
        .bind(&conversation.title)
        .bind(format_datetime(&conversation.created_at))
        .bind(format_datetime(&conversation.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(())
    }

    async fn get_conversation(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Option<Conversation>, StoreError> {
        let row = sqlx::query("SELECT * FROM conversations WHERE id = ?")
            .bind(conversation_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let conversation_row = ConversationRow::from_row(&row)
                    .map_err(|e| StoreError::Query(e.to_string()))?;
                Ok(Some(conversation_row.into_conversation()?))
            }
            None => Ok(None),
        }
    }

    async fn find_latest_empty(
        &self,
        owner_id: &Uuid,
        agent: AgentKind,
    ) -> Result<Option<Conversation>, StoreError> {
        let row = sqlx::query(
            r#"SELECT c.* FROM conversations c
               WHERE c.owner_id = ? AND c.agent = ?
                 AND NOT EXISTS (SELECT 1 FROM messages m WHERE m.conversation_id = c.id)
               ORDER BY c.created_at DESC, c.id DESC
               LIMIT 1"#,
        )
        .bind(owner_id.to_string())
        .bind(agent.to_string())
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let conversation_row = ConversationRow::from_row(&row)
                    .map_err(|e| StoreError::Query(e.to_string()))?;
                Ok(Some(conversation_row.into_conversation()?))
            }
            None => Ok(None),
        }
    }

    async fn list_conversations(
        &self,
        owner_id: &Uuid,
        agent: Option<AgentKind>,
    ) -> Result<Vec<Conversation>, StoreError> {
        let rows = match agent {
            Some(agent) => {
                sqlx::query(
                    "SELECT * FROM conversations WHERE owner_id = ? AND agent = ? ORDER BY updated_at DESC, id DESC",
                )
                .bind(owner_id.to_string())
                .bind(agent.to_string())
                .fetch_all(&self.pool.reader)
                .await
            }
            None => {
                sqlx::query(
                    "SELECT * FROM conversations WHERE owner_id = ? ORDER BY updated_at DESC, id DESC",
                )
                .bind(owner_id.to_string())
                .fetch_all(&self.pool.reader)
                .await
            }
        }
        .map_err(|e| StoreError::Query(e.to_string()))?;

        let mut conversations = Vec::with_capacity(rows.len());
        for row in &rows {
            let conversation_row = ConversationRow::from_row(row)
                .map_err(|e| StoreError::Query(e.to_string()))?;
            conversations.push(conversation_row.into_conversation()?);
        }

        Ok(conversations)
    }

    async fn update_title(&self, conversation_id: &Uuid, title: &str) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE conversations SET title = ? WHERE id = ?")
            .bind(title)
            .bind(conversation_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }

    async fn delete_conversation(
        &self,
        conversation_id: &Uuid,
        owner_id: &Uuid,
    ) -> Result<(), StoreError> {
        // Ownership check and delete in one transaction. Messages go with the
        // conversation via ON DELETE CASCADE.
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let row = sqlx::query("SELECT owner_id FROM conversations WHERE id = ?")
            .bind(conversation_id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let Some(row) = row else {
            return Err(StoreError::NotFound);
        };
        let stored_owner: String = row
            .try_get("owner_id")
            .map_err(|e| StoreError::Query(e.to_string()))?;
        if stored_owner != owner_id.to_string() {
            return Err(StoreError::Forbidden);
        }

        sqlx::query("DELETE FROM conversations WHERE id = ?")
            .bind(conversation_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(())
    }

    async fn append_message(&self, message: &Message, owner_id: &Uuid) -> Result<(), StoreError> {
        // Existence and ownership are verified in the same transaction as the
        // insert, so a concurrent delete cannot orphan the message.
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let row = sqlx::query("SELECT owner_id FROM conversations WHERE id = ?")
            .bind(message.conversation_id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let Some(row) = row else {
            return Err(StoreError::NotFound);
        };
        let stored_owner: String = row
            .try_get("owner_id")
            .map_err(|e| StoreError::Query(e.to_string()))?;
        if stored_owner != owner_id.to_string() {
            return Err(StoreError::Forbidden);
        }

        sqlx::query(
            r#"INSERT INTO messages (id, conversation_id, role, content, created_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(message.id.to_string())
        .bind(message.conversation_id.to_string())
        .bind(message.role.to_string())
        .bind(&message.content)
        .bind(format_datetime(&message.created_at))
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        // Touch the conversation so listings sort by latest activity
        sqlx::query("UPDATE conversations SET updated_at = ? WHERE id = ?")
            .bind(format_datetime(&message.created_at))
            .bind(message.conversation_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(())
    }

    async fn list_messages(
        &self,
        conversation_id: &Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Message>, StoreError> {
        let mut sql = String::from(
            "SELECT * FROM messages WHERE conversation_id = ? ORDER BY created_at ASC, id ASC",
        );

        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        } else if offset.is_some() {
            // SQLite requires LIMIT before OFFSET; -1 means unlimited
            sql.push_str(" LIMIT -1");
        }
        if let Some(offset) = offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        let rows = sqlx::query(&sql)
            .bind(conversation_id.to_string())
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            let msg_row = MessageRow::from_row(row)
                .map_err(|e| StoreError::Query(e.to_string()))?;
            messages.push(msg_row.into_message()?);
        }

        Ok(messages)
    }

    async fn count_messages(&self, conversation_id: &Uuid) -> Result<u64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM messages WHERE conversation_id = ?")
            .bind(conversation_id.to_string())
            .fetch_one(&self.pool.reader)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let count: i64 = row
            .try_get("cnt")
            .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(count as u64)
    }

    async fn count_all_conversations(&self) -> Result<u64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM conversations")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let count: i64 = row
            .try_get("cnt")
            .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(count as u64)
    }

    async fn count_all_messages(&self) -> Result<u64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM messages")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let count: i64 = row
            .try_get("cnt")
            .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(count as u64)
    }
}
