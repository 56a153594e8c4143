//! Session memory abstractions for Gridmind.
//!
//! A session is the short-term memory of one (agent, conversation) pair:
//! `SessionHandle` is the in-memory view, `SessionMemory` the pluggable
//! backend trait, and `SessionSynchronizer` keeps sessions consistent with
//! the durable message store.

pub mod adapter;
pub mod handle;
pub mod sync;

pub use adapter::SessionMemory;
pub use handle::SessionHandle;
pub use sync::SessionSynchronizer;
