//! Entitlement and quota admission for Gridmind.
//!
//! This module defines the `EntitlementStore` trait the infrastructure
//! layer implements and the `EntitlementGate` that runs the ordered
//! admission checks in front of every agent query.

pub mod gate;
pub mod store;

pub use gate::EntitlementGate;
pub use store::EntitlementStore;
