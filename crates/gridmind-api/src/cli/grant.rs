//! Entitlement provisioning command.
//!
//! `gmind grant --user <uuid> --plan <tier> [--agents a,b,...]`
//!
//! The admission path never creates entitlement rows; this command is the
//! only way a user gets one. Granting again replaces the plan and the hired
//! agents but keeps the current month's usage intact.

use anyhow::Result;
use chrono::Utc;
use console::style;
use uuid::Uuid;

use gridmind_core::entitlement::store::EntitlementStore;
use gridmind_types::agent::AgentKind;
use gridmind_types::entitlement::Entitlement;
use gridmind_types::plan::PlanTier;

use crate::state::AppState;

/// Provision or update an entitlement row.
pub async fn grant(
    state: &AppState,
    user_id: Uuid,
    plan: PlanTier,
    agents: Vec<AgentKind>,
    json: bool,
) -> Result<()> {
    let store = state.gate.store();

    let mut hired: Vec<AgentKind> = Vec::new();
    for agent in agents {
        if !hired.contains(&agent) {
            hired.push(agent);
        }
    }

    let entitlement = match store.get(&user_id).await? {
        Some(mut row) => {
            row.plan = plan;
            row.hired_agents = hired;
            row
        }
        None => {
            let mut row = Entitlement::default_for(user_id, Utc::now());
            row.plan = plan;
            row.hired_agents = hired;
            row
        }
    };
    store.upsert(&entitlement).await?;

    if json {
        let granted = serde_json::json!({
            "user_id": user_id,
            "plan": entitlement.plan,
            "hired_agents": &entitlement.hired_agents,
            "quota_ceiling": entitlement.quota_ceiling(),
            "monthly_query_count": entitlement.monthly_query_count,
        });
        println!("{}", serde_json::to_string_pretty(&granted)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Entitlement updated for {}",
        style("✓").green(),
        style(user_id).cyan()
    );
    println!("  Plan:   {}", style(entitlement.plan).bold());
    if entitlement.plan.blanket_agent_access() {
        println!("  Agents: {}", style("all (blanket access)").dim());
    } else if entitlement.hired_agents.is_empty() {
        println!("  Agents: {}", style("none hired").dim());
    } else {
        let names: Vec<String> = entitlement
            .hired_agents
            .iter()
            .map(|a| a.to_string())
            .collect();
        println!("  Agents: {}", names.join(", "));
    }
    println!(
        "  Quota:  {} queries/month",
        entitlement.quota_ceiling()
    );
    println!();

    Ok(())
}
