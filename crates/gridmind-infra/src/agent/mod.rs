//! Agent gateway HTTP client.
//!
//! Implements the `AgentInvoker` trait from `gridmind-core` against the
//! upstream agent runtime's SSE streaming endpoint.

pub mod client;
pub mod streaming;

pub use client::HttpAgentInvoker;
