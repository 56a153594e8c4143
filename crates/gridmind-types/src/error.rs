use thiserror::Error;

use crate::agent::AgentKind;
use crate::plan::PlanTier;

/// Errors from repository operations (used by trait definitions in gridmind-core).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("conversation not found")]
    NotFound,

    #[error("conversation belongs to another user")]
    Forbidden,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Admission refusals from the entitlement gate.
///
/// All of these map to 4xx responses and are never retried; each message
/// names the remediation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntitlementError {
    #[error("unknown agent: '{0}'")]
    UnknownAgent(String),

    #[error("agent '{agent}' is not hired on this workspace; hire it to start a conversation")]
    NotHired { agent: AgentKind },

    #[error("agent '{agent}' requires the '{required}' plan or higher; upgrade to use it")]
    PlanRequired {
        agent: AgentKind,
        required: PlanTier,
    },

    #[error("monthly quota of {ceiling} queries is exhausted (0 remaining); it resets at the start of next month")]
    QuotaExceeded { ceiling: u32 },
}

/// Errors from the entitlement gate as a whole.
#[derive(Debug, Error)]
pub enum GateError {
    #[error(transparent)]
    Entitlement(#[from] EntitlementError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from session memory backends.
///
/// These never surface to clients: session memory is a cache over the
/// durable store, so callers degrade to an ephemeral session instead.
#[derive(Debug, Error)]
pub enum SessionBackendError {
    #[error("session backend unavailable: {0}")]
    Unavailable(String),

    #[error("session io error: {0}")]
    Io(String),

    #[error("session state corrupt: {0}")]
    Corrupt(String),

    #[error("append gap: session is synced through {expected}, batch starts at {got}")]
    Gap { expected: u64, got: u64 },
}

/// Errors from agent gateway invocations.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent invocation failed: {0}")]
    Invocation(String),

    #[error("agent response timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("agent stream protocol error: {0}")]
    Protocol(String),
}
