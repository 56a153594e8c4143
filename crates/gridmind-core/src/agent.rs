//! AgentInvoker trait definition.
//!
//! The seam between the platform and the upstream agent runtime. The
//! pipeline only ever sees a stream of `AgentEvent`s; transport, auth, and
//! SSE decoding live behind this trait in gridmind-infra.

use std::pin::Pin;

use futures_util::Stream;

use gridmind_types::error::AgentError;
use gridmind_types::invocation::{AgentEvent, AgentRequest};

/// Trait for invoking an agent and streaming its reply.
///
/// Returns a boxed stream (not RPITIT) so the event stream is independent
/// of the invoker borrow; the pipeline holds it across yields.
///
/// Implementations live in gridmind-infra (e.g., `HttpAgentInvoker`).
pub trait AgentInvoker: Send + Sync {
    /// Invoke the agent for one turn. Events arrive as the agent produces
    /// them; the stream ends after `Done` or an error.
    fn invoke_streaming(
        &self,
        request: AgentRequest,
    ) -> Pin<Box<dyn Stream<Item = Result<AgentEvent, AgentError>> + Send + 'static>>;
}
