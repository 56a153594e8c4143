//! Business logic and repository trait definitions for Gridmind.
//!
//! This crate defines the "ports" (store traits) that the infrastructure
//! layer implements, plus the domain services built on them: conversation
//! resolution, the entitlement gate, session synchronization, and the
//! streaming turn pipeline. It depends only on `gridmind-types` -- never on
//! `gridmind-infra` or any database/IO crate.

pub mod agent;
pub mod conversation;
pub mod entitlement;
pub mod pipeline;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;
