//! Conversation persistence abstractions for Gridmind.
//!
//! This module defines the `MessageStore` trait that the infrastructure
//! layer implements, and the `ConversationService` that resolves which
//! conversation a turn addresses and builds the rows it appends.

pub mod service;
pub mod store;

pub use service::ConversationService;
pub use store::MessageStore;
