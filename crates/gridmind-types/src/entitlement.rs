//! Entitlement and admission types for the Gridmind quota gate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::AgentKind;
use crate::plan::PlanTier;

/// A user's subscription state: plan, hired agents, and quota usage.
///
/// `monthly_query_count` is charged on admission, not on success; a failed
/// agent call after admission still counts against the quota.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entitlement {
    pub user_id: Uuid,
    pub plan: PlanTier,
    pub hired_agents: Vec<AgentKind>,
    pub monthly_query_count: u32,
    pub last_reset_at: DateTime<Utc>,
    pub last_query_at: Option<DateTime<Utc>>,
}

impl Entitlement {
    /// The entitlement assumed for a user with no stored row: the lowest
    /// tier with nothing hired. The gate never persists this; rows are
    /// created by provisioning only.
    pub fn default_for(user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            plan: PlanTier::default(),
            hired_agents: Vec::new(),
            monthly_query_count: 0,
            last_reset_at: now,
            last_query_at: None,
        }
    }

    /// Whether this user may talk to `agent` at all: hired explicitly, or
    /// covered by a blanket-access plan.
    pub fn can_access(&self, agent: AgentKind) -> bool {
        self.plan.blanket_agent_access() || self.hired_agents.contains(&agent)
    }

    pub fn quota_ceiling(&self) -> u32 {
        self.plan.monthly_quota()
    }

    pub fn remaining(&self) -> u32 {
        self.quota_ceiling().saturating_sub(self.monthly_query_count)
    }
}

/// Successful admission through the entitlement gate.
///
/// `used` reflects the count after this admission's increment; the charge
/// stands even if the downstream agent call fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admission {
    pub agent: AgentKind,
    pub plan: PlanTier,
    pub used: u32,
    pub remaining: u32,
}
