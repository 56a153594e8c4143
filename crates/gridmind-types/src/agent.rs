//! Agent kinds offered on the Gridmind platform.
//!
//! Each agent is a specialized advisor for one slice of the energy domain.
//! The set is fixed at compile time; unknown agent strings are rejected at
//! the API edge before any entitlement or storage work happens.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::plan::PlanTier;

/// A specialized advisory agent.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (agent_kind IN ('market', 'pricing', 'news', 'policy', 'financial', 'maintenance'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    /// Market intelligence: demand, generation mix, interconnector flows.
    Market,
    /// Wholesale and retail price analysis.
    Pricing,
    /// Sector news digests.
    News,
    /// Regulatory and policy advisory.
    Policy,
    /// Financial modelling for energy assets.
    Financial,
    /// Operations and maintenance planning.
    Maintenance,
}

impl AgentKind {
    /// Every agent kind, in display order.
    pub const ALL: [AgentKind; 6] = [
        AgentKind::Market,
        AgentKind::Pricing,
        AgentKind::News,
        AgentKind::Policy,
        AgentKind::Financial,
        AgentKind::Maintenance,
    ];

    /// The minimum plan tier required to talk to this agent, if any.
    ///
    /// Agents without a required tier are available on every plan, subject
    /// to hiring and quota.
    pub fn required_plan(&self) -> Option<PlanTier> {
        match self {
            AgentKind::Financial => Some(PlanTier::Plus),
            _ => None,
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentKind::Market => write!(f, "market"),
            AgentKind::Pricing => write!(f, "pricing"),
            AgentKind::News => write!(f, "news"),
            AgentKind::Policy => write!(f, "policy"),
            AgentKind::Financial => write!(f, "financial"),
            AgentKind::Maintenance => write!(f, "maintenance"),
        }
    }
}

impl FromStr for AgentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "market" => Ok(AgentKind::Market),
            "pricing" => Ok(AgentKind::Pricing),
            "news" => Ok(AgentKind::News),
            "policy" => Ok(AgentKind::Policy),
            "financial" => Ok(AgentKind::Financial),
            "maintenance" => Ok(AgentKind::Maintenance),
            other => Err(format!("unknown agent: '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_kind_roundtrip() {
        for agent in AgentKind::ALL {
            let s = agent.to_string();
            let parsed: AgentKind = s.parse().unwrap();
            assert_eq!(agent, parsed);
        }
    }

    #[test]
    fn test_agent_kind_serde() {
        let agent = AgentKind::Maintenance;
        let json = serde_json::to_string(&agent).unwrap();
        assert_eq!(json, "\"maintenance\"");
        let parsed: AgentKind = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, AgentKind::Maintenance);
    }

    #[test]
    fn test_agent_kind_unknown() {
        let err = "weather".parse::<AgentKind>().unwrap_err();
        assert!(err.contains("weather"));
    }

    #[test]
    fn test_required_plan() {
        assert_eq!(AgentKind::Financial.required_plan(), Some(PlanTier::Plus));
        assert_eq!(AgentKind::Market.required_plan(), None);
        assert_eq!(AgentKind::News.required_plan(), None);
    }
}
