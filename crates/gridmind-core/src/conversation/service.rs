//! Conversation service: resolution, ownership checks, and appends.
//!
//! ConversationService decides which conversation a turn addresses (reuse
//! an empty one, validate an explicit id, or create a new one), builds the
//! message rows the pipeline appends, and derives display titles.

use chrono::Utc;
use gridmind_types::agent::AgentKind;
use gridmind_types::conversation::{Conversation, Message, SenderRole};
use gridmind_types::error::StoreError;
use tracing::{info, warn};
use uuid::Uuid;

use crate::conversation::store::MessageStore;

/// Longest auto-derived title, in characters.
const TITLE_MAX_CHARS: usize = 60;

/// Orchestrates conversation lifecycle and message appends.
///
/// Generic over `MessageStore` to maintain clean architecture
/// (gridmind-core never depends on gridmind-infra).
pub struct ConversationService<R: MessageStore> {
    store: R,
}

impl<R: MessageStore> ConversationService<R> {
    pub fn new(store: R) -> Self {
        Self { store }
    }

    /// Access the underlying store.
    pub fn store(&self) -> &R {
        &self.store
    }

    // --- Conversation lifecycle ---

    /// Start a conversation with `agent`, reusing the caller's most recent
    /// empty one when it exists.
    ///
    /// Reuse is an optimization: two racing first turns may each create a
    /// conversation, which is harmless.
    pub async fn start_conversation(
        &self,
        owner_id: Uuid,
        agent: AgentKind,
    ) -> Result<Conversation, StoreError> {
        if let Some(existing) = self.store.find_latest_empty(&owner_id, agent).await? {
            return Ok(existing);
        }

        let now = Utc::now();
        let conversation = Conversation {
            id: Uuid::now_v7(),
            owner_id,
            agent,
            title: None,
            created_at: now,
            updated_at: now,
        };
        self.store.create_conversation(&conversation).await?;
        info!(conversation_id = %conversation.id, agent = %agent, "Conversation created");
        Ok(conversation)
    }

    /// Resolve the conversation a turn addresses.
    ///
    /// `None` starts (or reuses) an empty conversation. `Some` must exist,
    /// be owned by the caller, and belong to the same agent; a mismatched
    /// agent is a `Conflict`.
    pub async fn resolve_for_turn(
        &self,
        owner_id: Uuid,
        agent: AgentKind,
        conversation_id: Option<Uuid>,
    ) -> Result<Conversation, StoreError> {
        let Some(id) = conversation_id else {
            return self.start_conversation(owner_id, agent).await;
        };

        let conversation = self
            .store
            .get_conversation(&id)
            .await?
            .ok_or(StoreError::NotFound)?;
        if conversation.owner_id != owner_id {
            return Err(StoreError::Forbidden);
        }
        if conversation.agent != agent {
            return Err(StoreError::Conflict(format!(
                "conversation belongs to agent '{}'",
                conversation.agent
            )));
        }
        Ok(conversation)
    }

    /// Get a conversation the caller owns.
    pub async fn get_owned(
        &self,
        conversation_id: &Uuid,
        owner_id: &Uuid,
    ) -> Result<Conversation, StoreError> {
        let conversation = self
            .store
            .get_conversation(conversation_id)
            .await?
            .ok_or(StoreError::NotFound)?;
        if conversation.owner_id != *owner_id {
            return Err(StoreError::Forbidden);
        }
        Ok(conversation)
    }

    /// List the caller's conversations, newest first.
    pub async fn list(
        &self,
        owner_id: &Uuid,
        agent: Option<AgentKind>,
    ) -> Result<Vec<Conversation>, StoreError> {
        self.store.list_conversations(owner_id, agent).await
    }

    /// Messages of a conversation the caller owns, in chronological order.
    pub async fn messages(
        &self,
        conversation_id: &Uuid,
        owner_id: &Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Message>, StoreError> {
        self.get_owned(conversation_id, owner_id).await?;
        self.store
            .list_messages(conversation_id, limit, offset)
            .await
    }

    /// Delete a conversation the caller owns, cascading to its messages.
    pub async fn delete(
        &self,
        conversation_id: &Uuid,
        owner_id: &Uuid,
    ) -> Result<(), StoreError> {
        self.store
            .delete_conversation(conversation_id, owner_id)
            .await?;
        info!(conversation_id = %conversation_id, "Conversation deleted");
        Ok(())
    }

    // --- Message appends ---

    /// Append the user's question to a conversation.
    ///
    /// Sets the display title from the first question of an untitled
    /// conversation; the title is cosmetic, so a failed title write only
    /// warns.
    pub async fn append_user_message(
        &self,
        conversation: &Conversation,
        owner_id: &Uuid,
        content: String,
    ) -> Result<Message, StoreError> {
        let message = Message {
            id: Uuid::now_v7(),
            conversation_id: conversation.id,
            role: SenderRole::User,
            content,
            created_at: Utc::now(),
        };
        self.store.append_message(&message, owner_id).await?;

        if conversation.title.is_none() {
            let title = derive_title(&message.content);
            if let Err(err) = self.store.update_title(&conversation.id, &title).await {
                warn!(conversation_id = %conversation.id, error = %err, "Failed to set conversation title");
            }
        }
        Ok(message)
    }

    /// Append the agent's full reply as one message.
    pub async fn append_assistant_message(
        &self,
        conversation_id: &Uuid,
        owner_id: &Uuid,
        content: String,
    ) -> Result<Message, StoreError> {
        let message = Message {
            id: Uuid::now_v7(),
            conversation_id: *conversation_id,
            role: SenderRole::Assistant,
            content,
            created_at: Utc::now(),
        };
        self.store.append_message(&message, owner_id).await?;
        Ok(message)
    }
}

/// Derive a display title from the first question: first line, trimmed,
/// cut at a char boundary.
fn derive_title(content: &str) -> String {
    let first_line = content.lines().next().unwrap_or("").trim();
    let mut title: String = first_line.chars().take(TITLE_MAX_CHARS).collect();
    if first_line.chars().count() > TITLE_MAX_CHARS {
        title.push('\u{2026}');
    }
    if title.is_empty() {
        title.push_str("New conversation");
    }
    title
}
