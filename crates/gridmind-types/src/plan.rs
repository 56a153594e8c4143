//! Subscription plan tiers for Gridmind.
//!
//! A plan tier sets the monthly query ceiling and whether the user gets
//! blanket access to every agent without hiring each one.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Subscription plan tier.
///
/// Ordering is meaningful: a higher tier satisfies any lower requirement.
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (plan_tier IN ('basic', 'plus', 'max'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    Basic,
    Plus,
    Max,
}

impl PlanTier {
    /// Every plan tier, lowest first.
    pub const ALL: [PlanTier; 3] = [PlanTier::Basic, PlanTier::Plus, PlanTier::Max];

    /// Monthly query ceiling for this tier.
    pub fn monthly_quota(&self) -> u32 {
        match self {
            PlanTier::Basic => 50,
            PlanTier::Plus => 500,
            PlanTier::Max => 2000,
        }
    }

    /// Whether this tier includes every agent without hiring them individually.
    pub fn blanket_agent_access(&self) -> bool {
        matches!(self, PlanTier::Max)
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanTier::Basic => write!(f, "basic"),
            PlanTier::Plus => write!(f, "plus"),
            PlanTier::Max => write!(f, "max"),
        }
    }
}

impl FromStr for PlanTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "basic" => Ok(PlanTier::Basic),
            "plus" => Ok(PlanTier::Plus),
            "max" => Ok(PlanTier::Max),
            other => Err(format!("invalid plan tier: '{other}'")),
        }
    }
}

impl Default for PlanTier {
    fn default() -> Self {
        PlanTier::Basic
    }
}
