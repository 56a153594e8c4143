//! SessionMemory trait definition.
//!
//! The pluggable session backend: in-process cache, file per session, or a
//! table in the main database. Exactly one backend is selected at startup.

use gridmind_types::error::SessionBackendError;
use gridmind_types::session::{SessionKey, SessionTurn};

use crate::session::handle::SessionHandle;

/// Trait for session memory backends.
///
/// Implementations live in gridmind-infra (`MemorySessionStore`,
/// `FileSessionStore`, `SqliteSessionStore`). Uses native async fn in
/// traits (RPITIT, Rust 2024 edition).
///
/// Backend failures are recoverable by contract: callers degrade to an
/// ephemeral handle rebuilt from the durable store and never surface a
/// `SessionBackendError` to the client.
pub trait SessionMemory: Send + Sync {
    /// Load the session for `key`, or an empty handle for an unknown key.
    ///
    /// Absence is not an error; only backend trouble is.
    fn load_or_create(
        &self,
        key: &SessionKey,
    ) -> impl std::future::Future<Output = Result<SessionHandle, SessionBackendError>> + Send;

    /// Apply a batch positionally and persist the result.
    ///
    /// Implementations apply via [`SessionHandle::apply_turns`] and only
    /// then write their backing state, so replayed and overlapping batches
    /// stay no-ops and a gapped batch never reaches storage.
    fn append_turns(
        &self,
        handle: &mut SessionHandle,
        from_offset: u64,
        turns: &[SessionTurn],
    ) -> impl std::future::Future<Output = Result<(), SessionBackendError>> + Send;

    /// Drop persisted state for `key`. Unknown keys are a no-op.
    fn discard(
        &self,
        key: &SessionKey,
    ) -> impl std::future::Future<Output = Result<(), SessionBackendError>> + Send;
}
