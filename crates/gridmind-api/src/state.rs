//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST
//! API. Services are generic over the store and invoker traits, but AppState
//! pins them to the concrete infra implementations.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use secrecy::SecretString;

use gridmind_core::conversation::service::ConversationService;
use gridmind_core::entitlement::gate::EntitlementGate;
use gridmind_core::pipeline::{PipelineConfig, TurnPipeline};
use gridmind_core::session::sync::SessionSynchronizer;
use gridmind_infra::agent::HttpAgentInvoker;
use gridmind_infra::config::{load_config, resolve_data_dir};
use gridmind_infra::session::SessionBackend;
use gridmind_infra::sqlite::conversation::SqliteMessageStore;
use gridmind_infra::sqlite::entitlement::SqliteEntitlementStore;
use gridmind_infra::sqlite::pool::{default_database_url, DatabasePool};
use gridmind_types::config::GridmindConfig;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteConversationService = ConversationService<SqliteMessageStore>;

pub type ConcreteEntitlementGate = EntitlementGate<SqliteEntitlementStore>;

pub type ConcreteTurnPipeline =
    TurnPipeline<SqliteMessageStore, SessionBackend, HttpAgentInvoker>;

/// Shared application state holding all services.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub conversations: Arc<ConcreteConversationService>,
    pub gate: Arc<ConcreteEntitlementGate>,
    pub pipeline: Arc<ConcreteTurnPipeline>,
    pub config: GridmindConfig,
    pub data_dir: PathBuf,
    pub started_at: Instant,
}

impl AppState {
    /// Initialize the application state: connect to DB, wire services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_config(&data_dir).await;

        // Initialize database
        let db_pool = DatabasePool::new(&default_database_url()).await?;

        // Services used by the HTTP handlers and CLI commands
        let conversations =
            ConversationService::new(SqliteMessageStore::new(db_pool.clone()));
        let gate = EntitlementGate::new(SqliteEntitlementStore::new(db_pool.clone()));

        // Session memory backend selected by config
        let session_backend = SessionBackend::build(config.session_backend, &data_dir, &db_pool);
        let synchronizer = SessionSynchronizer::new(session_backend, config.recency_window);

        // Agent gateway client. The bearer credential comes from the
        // environment only and is wrapped before it touches anything else.
        let gateway_url = std::env::var("GRIDMIND_AGENT_GATEWAY_URL")
            .unwrap_or_else(|_| config.agent_gateway_url.clone());
        let gateway_key = std::env::var("GRIDMIND_AGENT_GATEWAY_KEY")
            .ok()
            .map(SecretString::from);
        let invoker = HttpAgentInvoker::new(gateway_url, gateway_key);

        // The pipeline owns its own service instance (handlers share another)
        let pipeline = TurnPipeline::new(
            ConversationService::new(SqliteMessageStore::new(db_pool.clone())),
            synchronizer,
            invoker,
            PipelineConfig {
                agent_timeout: Duration::from_secs(config.agent_timeout_secs),
                retry_transient: config.retry_transient,
            },
        );

        Ok(Self {
            conversations: Arc::new(conversations),
            gate: Arc::new(gate),
            pipeline: Arc::new(pipeline),
            config,
            data_dir,
            started_at: Instant::now(),
        })
    }
}
