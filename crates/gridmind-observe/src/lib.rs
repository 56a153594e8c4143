//! Observability support for Gridmind: tracing subscriber setup and
//! OpenTelemetry GenAI attribute conventions for agent-invocation spans.

pub mod agent_attrs;
pub mod tracing_setup;
