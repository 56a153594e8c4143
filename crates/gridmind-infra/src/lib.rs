//! Infrastructure layer for Gridmind.
//!
//! Contains implementations of the repository traits defined in
//! `gridmind-core`: SQLite storage with split read/write pools, the three
//! session memory backends, the agent gateway HTTP client, and the
//! `config.toml` loader.

pub mod agent;
pub mod config;
pub mod session;
pub mod sqlite;
