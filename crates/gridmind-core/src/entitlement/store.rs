//! EntitlementStore trait definition.
//!
//! Persistence for entitlement rows plus the two conditional updates the
//! gate relies on: the lazy monthly reset and the atomic quota increment.

use chrono::{DateTime, Utc};
use gridmind_types::entitlement::Entitlement;
use gridmind_types::error::StoreError;
use uuid::Uuid;

/// Repository trait for entitlement persistence.
///
/// Implementations live in gridmind-infra (e.g., `SqliteEntitlementStore`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait EntitlementStore: Send + Sync {
    /// Fetch a user's entitlement row.
    fn get(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Entitlement>, StoreError>> + Send;

    /// Create or replace an entitlement row (provisioning).
    fn upsert(
        &self,
        entitlement: &Entitlement,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Zero the monthly counter if the row's last reset predates
    /// `period_start`.
    ///
    /// One conditional UPDATE: concurrent callers in the same period reset
    /// exactly once, and queries admitted after the reset are never lost.
    /// Returns whether a reset was applied; a missing row is `false`.
    fn reset_if_stale(
        &self,
        user_id: &Uuid,
        period_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<bool, StoreError>> + Send;

    /// Atomically increment the monthly counter if it is below `ceiling`.
    ///
    /// Returns the count after the increment, or `None` when the ceiling is
    /// already reached (or the row does not exist). The check and increment
    /// are one statement, so concurrent admissions can never overshoot.
    fn try_admit(
        &self,
        user_id: &Uuid,
        ceiling: u32,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Option<u32>, StoreError>> + Send;
}
