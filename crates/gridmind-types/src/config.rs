//! Global configuration types for Gridmind.
//!
//! `GridmindConfig` represents the top-level `config.toml` that controls
//! session memory, the agent gateway, and pipeline timing.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Which session memory backend to run.
///
/// Chosen once at startup; every live session uses the same backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackendKind {
    /// In-process map. Fast, lost on restart; single-instance only.
    Cache,
    /// One JSON state file per session under the data directory.
    File,
    /// `session_records` table in the main SQLite database.
    Relational,
}

impl fmt::Display for SessionBackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionBackendKind::Cache => write!(f, "cache"),
            SessionBackendKind::File => write!(f, "file"),
            SessionBackendKind::Relational => write!(f, "relational"),
        }
    }
}

impl FromStr for SessionBackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cache" => Ok(SessionBackendKind::Cache),
            "file" => Ok(SessionBackendKind::File),
            "relational" => Ok(SessionBackendKind::Relational),
            other => Err(format!("invalid session backend: '{other}'")),
        }
    }
}

impl Default for SessionBackendKind {
    fn default() -> Self {
        SessionBackendKind::Relational
    }
}

/// Top-level configuration for the Gridmind platform.
///
/// Loaded from `~/.gridmind/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridmindConfig {
    /// How many recent turns a session reconstruction fetches, and the most
    /// history one agent invocation sees.
    #[serde(default = "default_recency_window")]
    pub recency_window: usize,

    /// Session memory backend.
    #[serde(default)]
    pub session_backend: SessionBackendKind,

    /// Base URL of the upstream agent runtime.
    #[serde(default = "default_agent_gateway_url")]
    pub agent_gateway_url: String,

    /// Hard wall-clock ceiling for one agent invocation attempt, in seconds.
    #[serde(default = "default_agent_timeout_secs")]
    pub agent_timeout_secs: u64,

    /// Whether a transient agent failure is retried once before the turn fails.
    #[serde(default = "default_retry_transient")]
    pub retry_transient: bool,
}

fn default_recency_window() -> usize {
    40
}

fn default_agent_gateway_url() -> String {
    "http://127.0.0.1:8090".to_string()
}

fn default_agent_timeout_secs() -> u64 {
    120
}

fn default_retry_transient() -> bool {
    true
}

impl Default for GridmindConfig {
    fn default() -> Self {
        Self {
            recency_window: default_recency_window(),
            session_backend: SessionBackendKind::default(),
            agent_gateway_url: default_agent_gateway_url(),
            agent_timeout_secs: default_agent_timeout_secs(),
            retry_transient: default_retry_transient(),
        }
    }
}
