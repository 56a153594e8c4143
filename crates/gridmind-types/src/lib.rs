//! Shared domain types for Gridmind.
//!
//! This crate contains the core domain types used across the Gridmind
//! platform: agent kinds, plan tiers, conversations, session memory,
//! entitlements, turn events, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod agent;
pub mod config;
pub mod conversation;
pub mod entitlement;
pub mod error;
pub mod invocation;
pub mod plan;
pub mod session;
pub mod turn;
