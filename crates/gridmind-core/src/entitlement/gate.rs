//! Entitlement gate: ordered admission checks in front of every agent query.
//!
//! Check order is part of the contract: hired or blanket access first, then
//! the agent's required plan tier, then the atomic quota increment. The
//! increment is charge-on-attempt; a failed agent call after admission
//! still counts against the month.

use chrono::{DateTime, Datelike, NaiveTime, TimeZone, Utc};
use gridmind_types::agent::AgentKind;
use gridmind_types::entitlement::{Admission, Entitlement};
use gridmind_types::error::{EntitlementError, GateError};
use tracing::debug;
use uuid::Uuid;

use crate::entitlement::store::EntitlementStore;

/// Runs the admission checks against an `EntitlementStore`.
///
/// Generic over the store trait to maintain clean architecture
/// (gridmind-core never depends on gridmind-infra).
pub struct EntitlementGate<E: EntitlementStore> {
    store: E,
}

impl<E: EntitlementStore> EntitlementGate<E> {
    pub fn new(store: E) -> Self {
        Self { store }
    }

    /// Access the underlying store.
    pub fn store(&self) -> &E {
        &self.store
    }

    /// Admit or refuse one agent query for `user_id`.
    ///
    /// A user with no entitlement row is treated as basic with nothing
    /// hired; the gate never creates rows (provisioning does).
    pub async fn authorize(
        &self,
        user_id: Uuid,
        agent: AgentKind,
    ) -> Result<Admission, GateError> {
        let now = Utc::now();
        self.store
            .reset_if_stale(&user_id, month_start(now), now)
            .await?;

        let entitlement = match self.store.get(&user_id).await? {
            Some(entitlement) => entitlement,
            None => Entitlement::default_for(user_id, now),
        };

        if !entitlement.can_access(agent) {
            return Err(EntitlementError::NotHired { agent }.into());
        }

        if let Some(required) = agent.required_plan() {
            if entitlement.plan < required {
                return Err(EntitlementError::PlanRequired { agent, required }.into());
            }
        }

        let ceiling = entitlement.quota_ceiling();
        let used = match self.store.try_admit(&user_id, ceiling, now).await? {
            Some(used) => used,
            None => return Err(EntitlementError::QuotaExceeded { ceiling }.into()),
        };

        debug!(user_id = %user_id, agent = %agent, used, ceiling, "Query admitted");
        Ok(Admission {
            agent,
            plan: entitlement.plan,
            used,
            remaining: ceiling.saturating_sub(used),
        })
    }

    /// Current entitlement view for a user, with the monthly reset applied.
    pub async fn entitlement_for(&self, user_id: Uuid) -> Result<Entitlement, GateError> {
        let now = Utc::now();
        self.store
            .reset_if_stale(&user_id, month_start(now), now)
            .await?;
        Ok(self
            .store
            .get(&user_id)
            .await?
            .unwrap_or_else(|| Entitlement::default_for(user_id, now)))
    }
}

/// First instant of the UTC calendar month containing `now`.
pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let first_day = now.date_naive().with_day(1).unwrap_or(now.date_naive());
    Utc.from_utc_datetime(&first_day.and_time(NaiveTime::MIN))
}
