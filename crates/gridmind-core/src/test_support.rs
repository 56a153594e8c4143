//! In-memory fakes shared by unit tests across the crate.
//!
//! Each fake implements the corresponding store trait with a mutex-guarded
//! map, so trait semantics (ownership checks, conditional updates,
//! positional appends) are honored without a database.

use std::collections::{HashMap, VecDeque};
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use futures_util::Stream;
use uuid::Uuid;

use gridmind_types::agent::AgentKind;
use gridmind_types::conversation::{Conversation, Message, SenderRole};
use gridmind_types::entitlement::Entitlement;
use gridmind_types::error::{AgentError, SessionBackendError, StoreError};
use gridmind_types::invocation::{AgentEvent, AgentRequest};
use gridmind_types::session::{SessionKey, SessionState, SessionTurn};

use crate::agent::AgentInvoker;
use crate::conversation::store::MessageStore;
use crate::entitlement::store::EntitlementStore;
use crate::session::adapter::SessionMemory;
use crate::session::handle::SessionHandle;

// --- Message store fake ---

#[derive(Default)]
struct StoreInner {
    conversations: HashMap<Uuid, Conversation>,
    messages: HashMap<Uuid, Vec<Message>>,
}

pub(crate) struct InMemoryStore {
    inner: Mutex<StoreInner>,
}

impl InMemoryStore {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(StoreInner::default()),
        }
    }

    pub(crate) fn seed_conversation(&self, owner_id: Uuid, agent: AgentKind) -> Conversation {
        let now = Utc::now();
        let conversation = Conversation {
            id: Uuid::now_v7(),
            owner_id,
            agent,
            title: None,
            created_at: now,
            updated_at: now,
        };
        let mut inner = self.inner.lock().unwrap();
        inner
            .conversations
            .insert(conversation.id, conversation.clone());
        inner.messages.insert(conversation.id, Vec::new());
        conversation
    }

    pub(crate) fn seed_message(
        &self,
        conversation_id: &Uuid,
        role: SenderRole,
        content: &str,
    ) -> Message {
        let message = Message {
            id: Uuid::now_v7(),
            conversation_id: *conversation_id,
            role,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        self.inner
            .lock()
            .unwrap()
            .messages
            .entry(*conversation_id)
            .or_default()
            .push(message.clone());
        message
    }

    pub(crate) fn message_contents(&self, conversation_id: &Uuid) -> Vec<(SenderRole, String)> {
        self.inner
            .lock()
            .unwrap()
            .messages
            .get(conversation_id)
            .map(|messages| {
                messages
                    .iter()
                    .map(|m| (m.role, m.content.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl MessageStore for InMemoryStore {
    async fn create_conversation(&self, conversation: &Conversation) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .conversations
            .insert(conversation.id, conversation.clone());
        inner.messages.entry(conversation.id).or_default();
        Ok(())
    }

    async fn get_conversation(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Option<Conversation>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .conversations
            .get(conversation_id)
            .cloned())
    }

    async fn find_latest_empty(
        &self,
        owner_id: &Uuid,
        agent: AgentKind,
    ) -> Result<Option<Conversation>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .conversations
            .values()
            .filter(|c| {
                c.owner_id == *owner_id
                    && c.agent == agent
                    && inner
                        .messages
                        .get(&c.id)
                        .map(|m| m.is_empty())
                        .unwrap_or(true)
            })
            .max_by_key(|c| c.id)
            .cloned())
    }

    async fn list_conversations(
        &self,
        owner_id: &Uuid,
        agent: Option<AgentKind>,
    ) -> Result<Vec<Conversation>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut conversations: Vec<Conversation> = inner
            .conversations
            .values()
            .filter(|c| c.owner_id == *owner_id && agent.is_none_or(|a| c.agent == a))
            .cloned()
            .collect();
        conversations.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(conversations)
    }

    async fn update_title(&self, conversation_id: &Uuid, title: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.conversations.get_mut(conversation_id) {
            Some(conversation) => {
                conversation.title = Some(title.to_string());
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete_conversation(
        &self,
        conversation_id: &Uuid,
        owner_id: &Uuid,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.conversations.get(conversation_id) {
            None => Err(StoreError::NotFound),
            Some(conversation) if conversation.owner_id != *owner_id => {
                Err(StoreError::Forbidden)
            }
            Some(_) => {
                inner.conversations.remove(conversation_id);
                inner.messages.remove(conversation_id);
                Ok(())
            }
        }
    }

    async fn append_message(&self, message: &Message, owner_id: &Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.conversations.get(&message.conversation_id) {
            None => Err(StoreError::NotFound),
            Some(conversation) if conversation.owner_id != *owner_id => {
                Err(StoreError::Forbidden)
            }
            Some(_) => {
                inner
                    .messages
                    .entry(message.conversation_id)
                    .or_default()
                    .push(message.clone());
                Ok(())
            }
        }
    }

    async fn list_messages(
        &self,
        conversation_id: &Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Message>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let messages = inner
            .messages
            .get(conversation_id)
            .cloned()
            .unwrap_or_default();
        let start = offset.unwrap_or(0).max(0) as usize;
        let take = limit.map(|l| l.max(0) as usize).unwrap_or(usize::MAX);
        Ok(messages.into_iter().skip(start).take(take).collect())
    }

    async fn count_messages(&self, conversation_id: &Uuid) -> Result<u64, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .messages
            .get(conversation_id)
            .map(|m| m.len() as u64)
            .unwrap_or(0))
    }

    async fn count_all_conversations(&self) -> Result<u64, StoreError> {
        Ok(self.inner.lock().unwrap().conversations.len() as u64)
    }

    async fn count_all_messages(&self) -> Result<u64, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .messages
            .values()
            .map(|m| m.len() as u64)
            .sum())
    }
}

// --- Session memory fake ---

pub(crate) struct RecordingMemory {
    states: Mutex<HashMap<String, SessionState>>,
    pub(crate) load_calls: AtomicUsize,
    pub(crate) append_calls: AtomicUsize,
    pub(crate) discard_calls: AtomicUsize,
    pub(crate) fail_loads: AtomicBool,
    pub(crate) fail_appends: AtomicBool,
}

impl RecordingMemory {
    pub(crate) fn new() -> Self {
        Self {
            states: Mutex::new(HashMap::new()),
            load_calls: AtomicUsize::new(0),
            append_calls: AtomicUsize::new(0),
            discard_calls: AtomicUsize::new(0),
            fail_loads: AtomicBool::new(false),
            fail_appends: AtomicBool::new(false),
        }
    }

    pub(crate) fn seed_state(&self, key: &SessionKey, state: SessionState) {
        self.states
            .lock()
            .unwrap()
            .insert(key.as_str().to_string(), state);
    }

    pub(crate) fn state_of(&self, key: &SessionKey) -> Option<SessionState> {
        self.states.lock().unwrap().get(key.as_str()).cloned()
    }
}

impl SessionMemory for RecordingMemory {
    async fn load_or_create(&self, key: &SessionKey) -> Result<SessionHandle, SessionBackendError> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(SessionBackendError::Unavailable(
                "test backend down".to_string(),
            ));
        }
        Ok(match self.states.lock().unwrap().get(key.as_str()) {
            Some(state) => SessionHandle::from_state(key.clone(), state.clone()),
            None => SessionHandle::empty(key.clone()),
        })
    }

    async fn append_turns(
        &self,
        handle: &mut SessionHandle,
        from_offset: u64,
        turns: &[SessionTurn],
    ) -> Result<(), SessionBackendError> {
        self.append_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(SessionBackendError::Io("test write failure".to_string()));
        }
        handle.apply_turns(from_offset, turns)?;
        self.states
            .lock()
            .unwrap()
            .insert(handle.key().as_str().to_string(), handle.to_state());
        Ok(())
    }

    async fn discard(&self, key: &SessionKey) -> Result<(), SessionBackendError> {
        self.discard_calls.fetch_add(1, Ordering::SeqCst);
        self.states.lock().unwrap().remove(key.as_str());
        Ok(())
    }
}

// --- Entitlement store fake ---

pub(crate) struct InMemoryEntitlements {
    rows: Mutex<HashMap<Uuid, Entitlement>>,
}

impl InMemoryEntitlements {
    pub(crate) fn new() -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
        }
    }
}

impl EntitlementStore for InMemoryEntitlements {
    async fn get(&self, user_id: &Uuid) -> Result<Option<Entitlement>, StoreError> {
        Ok(self.rows.lock().unwrap().get(user_id).cloned())
    }

    async fn upsert(&self, entitlement: &Entitlement) -> Result<(), StoreError> {
        self.rows
            .lock()
            .unwrap()
            .insert(entitlement.user_id, entitlement.clone());
        Ok(())
    }

    async fn reset_if_stale(
        &self,
        user_id: &Uuid,
        period_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.get_mut(user_id) {
            if row.last_reset_at < period_start {
                row.monthly_query_count = 0;
                row.last_reset_at = now;
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn try_admit(
        &self,
        user_id: &Uuid,
        ceiling: u32,
        now: DateTime<Utc>,
    ) -> Result<Option<u32>, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(user_id) {
            Some(row) if row.monthly_query_count < ceiling => {
                row.monthly_query_count += 1;
                row.last_query_at = Some(now);
                Ok(Some(row.monthly_query_count))
            }
            _ => Ok(None),
        }
    }
}

// --- Agent invoker fake ---

/// One scripted invocation: a fixed event sequence, or a stream that never
/// produces (for timeout tests).
pub(crate) enum Script {
    Events(Vec<Result<AgentEvent, AgentError>>),
    Hang,
}

pub(crate) struct ScriptedInvoker {
    scripts: Mutex<VecDeque<Script>>,
    pub(crate) calls: AtomicUsize,
    pub(crate) requests: Mutex<Vec<AgentRequest>>,
}

impl ScriptedInvoker {
    pub(crate) fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl AgentInvoker for ScriptedInvoker {
    fn invoke_streaming(
        &self,
        request: AgentRequest,
    ) -> Pin<Box<dyn Stream<Item = Result<AgentEvent, AgentError>> + Send + 'static>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);
        match self.scripts.lock().unwrap().pop_front() {
            Some(Script::Events(events)) => Box::pin(futures_util::stream::iter(events)),
            Some(Script::Hang) => Box::pin(futures_util::stream::pending()),
            None => Box::pin(futures_util::stream::iter(Vec::new())),
        }
    }
}
