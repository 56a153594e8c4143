//! HttpAgentInvoker -- concrete [`AgentInvoker`] implementation for the
//! agent gateway.
//!
//! Sends one POST per turn to `{base_url}/agents/{agent}/stream` and decodes
//! the SSE reply. The gateway credential is wrapped in
//! [`secrecy::SecretString`] and is never logged or included in `Debug`
//! output.

use std::pin::Pin;
use std::time::Duration;

use futures_util::Stream;
use secrecy::SecretString;

use gridmind_core::agent::AgentInvoker;
use gridmind_types::agent::AgentKind;
use gridmind_types::error::AgentError;
use gridmind_types::invocation::{AgentEvent, AgentRequest};

use super::streaming::create_agent_stream;

/// HTTP client for the upstream agent runtime.
///
/// The pipeline owns the wall-clock deadline for a turn, so this client
/// sets only a connect timeout and leaves the response stream unbounded.
pub struct HttpAgentInvoker {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl HttpAgentInvoker {
    /// Create a new gateway client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Gateway base URL (e.g., "http://127.0.0.1:8090")
    /// * `api_key` - Optional bearer credential for the gateway
    pub fn new(base_url: String, api_key: Option<SecretString>) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Build the streaming endpoint URL for an agent.
    fn stream_url(&self, agent: AgentKind) -> String {
        format!("{}/agents/{}/stream", self.base_url, agent)
    }
}

// HttpAgentInvoker intentionally does not derive Debug; the SecretString
// field already refuses to print itself, and omitting Debug keeps the rest
// of the client state out of logs too.

impl AgentInvoker for HttpAgentInvoker {
    fn invoke_streaming(
        &self,
        request: AgentRequest,
    ) -> Pin<Box<dyn Stream<Item = Result<AgentEvent, AgentError>> + Send + 'static>> {
        let url = self.stream_url(request.agent);
        create_agent_stream(self.client.clone(), url, request, self.api_key.clone())
    }
}
