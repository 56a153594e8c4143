//! OpenTelemetry GenAI Semantic Convention attribute constants.
//!
//! These follow the OTel GenAI Semantic Conventions for consistent
//! agent-invocation instrumentation across the codebase. All constants are
//! string slices usable as `tracing` span field values.
//!
//! Span naming convention: `"{operation} {agent}"` (e.g., `"invoke_agent market"`),
//! applied through the `otel.name` field so the exported span carries the
//! dynamic name while the `tracing` macro keeps a static one.

// --- Required attributes ---

/// The name of the operation being performed (e.g., "invoke_agent").
pub const GEN_AI_OPERATION_NAME: &str = "gen_ai.operation.name";

/// The name of the GenAI provider behind the invocation.
pub const GEN_AI_PROVIDER_NAME: &str = "gen_ai.provider.name";

// --- Agent-specific attributes ---

/// The display name of the agent being invoked.
pub const GEN_AI_AGENT_NAME: &str = "gen_ai.agent.name";

/// The conversation the invocation belongs to.
pub const GEN_AI_CONVERSATION_ID: &str = "gen_ai.conversation.id";

// --- Operation name values ---

/// Agent invocation operation.
pub const OP_INVOKE_AGENT: &str = "invoke_agent";

// --- Provider name values ---

/// The upstream agent gateway this service streams from.
pub const PROVIDER_GATEWAY: &str = "gridmind-gateway";

/// Span name per the GenAI convention: `"{operation} {target}"`.
pub fn span_name(operation: &str, target: &str) -> String {
    format!("{operation} {target}")
}
