//! MessageStore trait definition.
//!
//! Append-only persistence for conversations and their messages. The store
//! is the single source of truth for history; session memory only ever
//! caches what these operations return.

use gridmind_types::agent::AgentKind;
use gridmind_types::conversation::{Conversation, Message};
use gridmind_types::error::StoreError;
use uuid::Uuid;

/// Repository trait for conversation and message persistence.
///
/// Implementations live in gridmind-infra (e.g., `SqliteMessageStore`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait MessageStore: Send + Sync {
    /// Persist a new conversation.
    fn create_conversation(
        &self,
        conversation: &Conversation,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Get a conversation by its unique ID.
    fn get_conversation(
        &self,
        conversation_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Conversation>, StoreError>> + Send;

    /// The caller's most recent conversation with `agent` that has no
    /// messages yet, if any. Used to reuse blank conversations instead of
    /// piling up empty rows.
    fn find_latest_empty(
        &self,
        owner_id: &Uuid,
        agent: AgentKind,
    ) -> impl std::future::Future<Output = Result<Option<Conversation>, StoreError>> + Send;

    /// List an owner's conversations, newest first, optionally filtered to
    /// one agent.
    fn list_conversations(
        &self,
        owner_id: &Uuid,
        agent: Option<AgentKind>,
    ) -> impl std::future::Future<Output = Result<Vec<Conversation>, StoreError>> + Send;

    /// Update a conversation's display title.
    fn update_title(
        &self,
        conversation_id: &Uuid,
        title: &str,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Delete a conversation and cascade to its messages.
    ///
    /// Fails `NotFound` for a missing conversation and `Forbidden` for one
    /// owned by another user.
    fn delete_conversation(
        &self,
        conversation_id: &Uuid,
        owner_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Append one message to its conversation.
    ///
    /// Existence (`NotFound`) and ownership (`Forbidden`) are verified in
    /// the same transaction as the insert, and the conversation's
    /// `updated_at` is touched atomically. Messages are never updated or
    /// deleted individually.
    fn append_message(
        &self,
        message: &Message,
        owner_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Messages in chronological order `(created_at ASC, id ASC)`.
    fn list_messages(
        &self,
        conversation_id: &Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, StoreError>> + Send;

    /// Authoritative message count for a conversation.
    ///
    /// Always derived from the rows themselves, never a denormalized
    /// counter, so session offsets can rely on it.
    fn count_messages(
        &self,
        conversation_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<u64, StoreError>> + Send;

    /// Count all conversations on the instance.
    fn count_all_conversations(
        &self,
    ) -> impl std::future::Future<Output = Result<u64, StoreError>> + Send;

    /// Count all messages on the instance.
    fn count_all_messages(
        &self,
    ) -> impl std::future::Future<Output = Result<u64, StoreError>> + Send;
}
