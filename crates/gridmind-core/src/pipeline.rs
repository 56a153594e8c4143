//! Streaming response pipeline: one user turn end-to-end.
//!
//! The order of operations is the contract. The user message is committed
//! to the durable store before the agent is invoked; deltas are forwarded
//! to the client while the full response accumulates in memory; nothing
//! partial is ever persisted. A turn that fails after acceptance keeps the
//! question, and the next synchronize folds it into session memory.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use gridmind_types::conversation::Conversation;
use gridmind_types::error::{AgentError, StoreError};
use gridmind_types::invocation::{AgentEvent, AgentRequest};
use gridmind_types::turn::{TurnEvent, TurnPhase};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::agent::AgentInvoker;
use crate::conversation::service::ConversationService;
use crate::conversation::store::MessageStore;
use crate::session::adapter::SessionMemory;
use crate::session::sync::SessionSynchronizer;

/// Timing and retry knobs for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Hard wall-clock ceiling for one agent invocation attempt.
    pub agent_timeout: Duration,
    /// Whether a transient failure is retried once before the turn fails.
    pub retry_transient: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            agent_timeout: Duration::from_secs(120),
            retry_transient: true,
        }
    }
}

/// Drives one user turn: PENDING -> STREAMING -> {COMPLETED, FAILED}.
pub struct TurnPipeline<R, S, A>
where
    R: MessageStore,
    S: SessionMemory,
    A: AgentInvoker,
{
    conversations: ConversationService<R>,
    synchronizer: SessionSynchronizer<S>,
    invoker: A,
    config: PipelineConfig,
}

impl<R, S, A> TurnPipeline<R, S, A>
where
    R: MessageStore + 'static,
    S: SessionMemory + 'static,
    A: AgentInvoker + 'static,
{
    pub fn new(
        conversations: ConversationService<R>,
        synchronizer: SessionSynchronizer<S>,
        invoker: A,
        config: PipelineConfig,
    ) -> Self {
        Self {
            conversations,
            synchronizer,
            invoker,
            config,
        }
    }

    /// Run one turn against `conversation` and stream its lifecycle events.
    ///
    /// The caller has already resolved the conversation and passed the
    /// entitlement gate; dropping the returned stream mid-flight abandons
    /// the agent call but never the committed user message.
    pub fn stream_turn(
        self: Arc<Self>,
        conversation: Conversation,
        user_id: Uuid,
        text: String,
    ) -> Pin<Box<dyn Stream<Item = TurnEvent> + Send + 'static>> {
        Box::pin(async_stream::stream! {
            let mut phase = TurnPhase::Pending;
            let conversation_id = conversation.id;

            // Session context reflects history before this turn.
            let handle = match self
                .synchronizer
                .synchronize(self.conversations.store(), &conversation)
                .await
            {
                Ok(handle) => handle,
                Err(err) => {
                    error!(conversation_id = %conversation_id, error = %err, "Turn failed before acceptance");
                    advance(&mut phase, TurnPhase::Failed, &conversation_id);
                    yield TurnEvent::Failed {
                        reason: failure_reason(&err),
                        question_saved: false,
                    };
                    return;
                }
            };

            // Commit the question before any agent work.
            let user_message = match self
                .conversations
                .append_user_message(&conversation, &user_id, text.clone())
                .await
            {
                Ok(message) => message,
                Err(err) => {
                    error!(conversation_id = %conversation_id, error = %err, "Failed to persist user message");
                    advance(&mut phase, TurnPhase::Failed, &conversation_id);
                    yield TurnEvent::Failed {
                        reason: failure_reason(&err),
                        question_saved: false,
                    };
                    return;
                }
            };
            yield TurnEvent::Accepted {
                conversation_id,
                user_message_id: user_message.id,
            };

            advance(&mut phase, TurnPhase::Streaming, &conversation_id);

            let request = AgentRequest {
                agent: conversation.agent,
                prompt: text,
                history: handle.recent(self.synchronizer.recency_window()).to_vec(),
            };

            let max_attempts = if self.config.retry_transient { 2 } else { 1 };
            let timeout_secs = self.config.agent_timeout.as_secs();
            let mut buffer = String::new();
            let mut failure: Option<AgentError> = None;

            'attempts: for attempt in 1..=max_attempts {
                let mut events = self.invoker.invoke_streaming(request.clone());
                let deadline = tokio::time::Instant::now() + self.config.agent_timeout;

                loop {
                    let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
                    let next = match tokio::time::timeout(remaining, events.next()).await {
                        Ok(item) => item,
                        Err(_) => {
                            failure = Some(AgentError::Timeout { secs: timeout_secs });
                            break;
                        }
                    };
                    match next {
                        Some(Ok(AgentEvent::Delta { text })) => {
                            buffer.push_str(&text);
                            yield TurnEvent::Delta { text };
                        }
                        Some(Ok(AgentEvent::Done)) | None => {
                            failure = None;
                            break 'attempts;
                        }
                        Some(Err(err)) => {
                            failure = Some(err);
                            break;
                        }
                    }
                }

                // Retry once, but only while the client has seen nothing;
                // restarting a partially streamed answer is worse than failing.
                if attempt < max_attempts && buffer.is_empty() {
                    if let Some(err) = &failure {
                        warn!(conversation_id = %conversation_id, attempt, error = %err, "Agent attempt failed, retrying");
                        continue;
                    }
                }
                break;
            }

            if failure.is_none() && buffer.is_empty() {
                failure = Some(AgentError::Invocation(
                    "agent returned an empty response".to_string(),
                ));
            }

            if let Some(err) = failure {
                warn!(conversation_id = %conversation_id, error = %err, "Turn failed, user message kept");
                advance(&mut phase, TurnPhase::Failed, &conversation_id);
                yield TurnEvent::Failed {
                    reason: err.to_string(),
                    question_saved: true,
                };
                return;
            }

            // The whole buffered response becomes one assistant message.
            let assistant = match self
                .conversations
                .append_assistant_message(&conversation_id, &user_id, buffer)
                .await
            {
                Ok(message) => message,
                Err(err) => {
                    error!(conversation_id = %conversation_id, error = %err, "Failed to persist assistant message");
                    advance(&mut phase, TurnPhase::Failed, &conversation_id);
                    yield TurnEvent::Failed {
                        reason: failure_reason(&err),
                        question_saved: true,
                    };
                    return;
                }
            };

            // Fold both new turns into session memory. Best effort: the
            // store already holds them and the next sync repairs the rest.
            if let Err(err) = self
                .synchronizer
                .synchronize(self.conversations.store(), &conversation)
                .await
            {
                warn!(conversation_id = %conversation_id, error = %err, "Post-turn session sync failed");
            }

            advance(&mut phase, TurnPhase::Completed, &conversation_id);
            info!(
                conversation_id = %conversation_id,
                assistant_message_id = %assistant.id,
                "Turn completed"
            );
            yield TurnEvent::Completed {
                assistant_message_id: assistant.id,
            };
        })
    }
}

/// Move the turn state machine, asserting the transition is legal.
fn advance(phase: &mut TurnPhase, next: TurnPhase, conversation_id: &Uuid) {
    debug_assert!(
        phase.can_advance_to(next),
        "illegal turn transition {phase} -> {next}"
    );
    *phase = next;
    debug!(conversation_id = %conversation_id, phase = %next, "Turn phase");
}

/// Client-safe reason for a store failure; details stay in the logs.
fn failure_reason(err: &StoreError) -> String {
    match err {
        StoreError::NotFound => "conversation no longer exists".to_string(),
        StoreError::Forbidden => "conversation belongs to another user".to_string(),
        StoreError::Conflict(msg) => msg.clone(),
        StoreError::Connection | StoreError::Query(_) => {
            "conversation store unavailable".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{InMemoryStore, RecordingMemory, Script, ScriptedInvoker};
    use gridmind_types::agent::AgentKind;
    use gridmind_types::conversation::SenderRole;
    use std::sync::atomic::Ordering;

    fn delta(text: &str) -> Result<AgentEvent, AgentError> {
        Ok(AgentEvent::Delta {
            text: text.to_string(),
        })
    }

    fn done() -> Result<AgentEvent, AgentError> {
        Ok(AgentEvent::Done)
    }

    struct Fixture {
        pipeline: Arc<TurnPipeline<InMemoryStore, RecordingMemory, ScriptedInvoker>>,
        conversation: Conversation,
        owner: Uuid,
    }

    fn fixture(scripts: Vec<Script>, config: PipelineConfig) -> Fixture {
        let store = InMemoryStore::new();
        let owner = Uuid::now_v7();
        let conversation = store.seed_conversation(owner, AgentKind::Market);
        let pipeline = Arc::new(TurnPipeline::new(
            ConversationService::new(store),
            SessionSynchronizer::new(RecordingMemory::new(), 40),
            ScriptedInvoker::new(scripts),
            config,
        ));
        Fixture {
            pipeline,
            conversation,
            owner,
        }
    }

    fn store(fixture: &Fixture) -> &InMemoryStore {
        fixture.pipeline.conversations.store()
    }

    async fn collect(fixture: &Fixture, text: &str) -> Vec<TurnEvent> {
        Arc::clone(&fixture.pipeline)
            .stream_turn(
                fixture.conversation.clone(),
                fixture.owner,
                text.to_string(),
            )
            .collect()
            .await
    }

    #[tokio::test]
    async fn test_happy_path_persists_one_assistant_message() {
        let fx = fixture(
            vec![Script::Events(vec![delta("The "), delta("margin "), delta("is thin."), done()])],
            PipelineConfig::default(),
        );

        let events = collect(&fx, "How tight is tomorrow evening?").await;
        assert!(matches!(events[0], TurnEvent::Accepted { .. }));
        assert_eq!(
            events.iter().filter(|e| matches!(e, TurnEvent::Delta { .. })).count(),
            3
        );
        assert!(matches!(events.last(), Some(TurnEvent::Completed { .. })));

        let messages = store(&fx).message_contents(&fx.conversation.id);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].0, SenderRole::User);
        assert_eq!(messages[1], (SenderRole::Assistant, "The margin is thin.".to_string()));

        // both turns folded into session memory
        let memory = fx.pipeline.synchronizer.memory();
        let key = gridmind_types::session::SessionKey::for_conversation(
            fx.conversation.agent,
            &fx.conversation.id,
        );
        let state = memory.state_of(&key).unwrap();
        assert_eq!(state.base_offset + state.turns.len() as u64, 2);
    }

    #[tokio::test]
    async fn test_failure_after_output_keeps_question_only() {
        let fx = fixture(
            vec![Script::Events(vec![
                delta("partial"),
                Err(AgentError::Invocation("upstream reset".to_string())),
            ])],
            PipelineConfig::default(),
        );

        let events = collect(&fx, "What broke?").await;
        match events.last() {
            Some(TurnEvent::Failed {
                question_saved, ..
            }) => assert!(question_saved),
            other => panic!("unexpected final event: {other:?}"),
        }

        // no retry once output has streamed
        assert_eq!(fx.pipeline.invoker.calls.load(Ordering::SeqCst), 1);

        let messages = store(&fx).message_contents(&fx.conversation.id);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, SenderRole::User);
    }

    #[tokio::test]
    async fn test_transient_failure_retries_once_then_completes() {
        let fx = fixture(
            vec![
                Script::Events(vec![Err(AgentError::Invocation("connect refused".to_string()))]),
                Script::Events(vec![delta("recovered"), done()]),
            ],
            PipelineConfig::default(),
        );

        let events = collect(&fx, "retry me").await;
        assert!(matches!(events.last(), Some(TurnEvent::Completed { .. })));
        assert_eq!(fx.pipeline.invoker.calls.load(Ordering::SeqCst), 2);

        let messages = store(&fx).message_contents(&fx.conversation.id);
        assert_eq!(messages[1].1, "recovered");
    }

    #[tokio::test]
    async fn test_retry_disabled_fails_on_first_error() {
        let fx = fixture(
            vec![Script::Events(vec![Err(AgentError::Invocation("boom".to_string()))])],
            PipelineConfig {
                retry_transient: false,
                ..PipelineConfig::default()
            },
        );

        let events = collect(&fx, "no retries").await;
        assert!(matches!(events.last(), Some(TurnEvent::Failed { .. })));
        assert_eq!(fx.pipeline.invoker.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_response_fails_without_persisting() {
        let fx = fixture(
            vec![Script::Events(vec![done()]), Script::Events(vec![done()])],
            PipelineConfig::default(),
        );

        let events = collect(&fx, "anything there?").await;
        match events.last() {
            Some(TurnEvent::Failed {
                reason,
                question_saved,
            }) => {
                assert!(reason.contains("empty"));
                assert!(question_saved);
            }
            other => panic!("unexpected final event: {other:?}"),
        }
        assert_eq!(store(&fx).message_contents(&fx.conversation.id).len(), 1);
    }

    #[tokio::test]
    async fn test_stalled_stream_times_out() {
        let fx = fixture(
            vec![Script::Hang],
            PipelineConfig {
                agent_timeout: Duration::from_millis(50),
                retry_transient: false,
            },
        );

        let events = collect(&fx, "are you there?").await;
        match events.last() {
            Some(TurnEvent::Failed {
                reason,
                question_saved,
            }) => {
                assert!(reason.contains("timed out"));
                assert!(question_saved);
            }
            other => panic!("unexpected final event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_question_committed_before_invocation() {
        let fx = fixture(
            vec![Script::Events(vec![delta("ok"), done()])],
            PipelineConfig::default(),
        );

        // seed an existing exchange so history is non-trivial
        store(&fx).seed_message(&fx.conversation.id, SenderRole::User, "earlier question");
        store(&fx).seed_message(&fx.conversation.id, SenderRole::Assistant, "earlier answer");

        collect(&fx, "new question").await;

        let requests = fx.pipeline.invoker.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        // the new question is the prompt, not part of the history
        assert_eq!(requests[0].prompt, "new question");
        let history: Vec<&str> = requests[0]
            .history
            .iter()
            .map(|t| t.content.as_str())
            .collect();
        assert_eq!(history, vec!["earlier question", "earlier answer"]);
    }

    #[tokio::test]
    async fn test_session_backend_failure_never_blocks_turn() {
        let fx = fixture(
            vec![Script::Events(vec![delta("still here"), done()])],
            PipelineConfig::default(),
        );
        fx.pipeline
            .synchronizer
            .memory()
            .fail_loads
            .store(true, Ordering::SeqCst);

        let events = collect(&fx, "backend is down").await;
        assert!(matches!(events.last(), Some(TurnEvent::Completed { .. })));
        assert_eq!(store(&fx).message_contents(&fx.conversation.id).len(), 2);
    }
}
