//! System status dashboard command.

use anyhow::Result;
use console::style;

use gridmind_core::conversation::store::MessageStore;

use crate::state::AppState;

/// Display system status dashboard.
///
/// Shows conversation and message totals, gateway configuration, session
/// backend, data directory, and version.
pub async fn status(state: &AppState, json: bool) -> Result<()> {
    let total_conversations = state.conversations.store().count_all_conversations().await?;
    let total_messages = state.conversations.store().count_all_messages().await?;

    if json {
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "conversations": total_conversations,
            "messages": total_messages,
            "session_backend": state.config.session_backend.to_string(),
            "recency_window": state.config.recency_window,
            "agent_gateway_url": state.config.agent_gateway_url,
            "agent_timeout_secs": state.config.agent_timeout_secs,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Gridmind v{}",
        style("⚡").bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!();

    // Conversation counts
    println!("  {}", style("── Conversations ──").dim());
    println!(
        "  Total:    {}",
        style(total_conversations).bold()
    );
    println!(
        "  Messages: {}",
        format_count(total_messages)
    );
    println!();

    // Agent gateway
    println!("  {}", style("── Agents ──").dim());
    println!(
        "  Gateway:  {}",
        style(&state.config.agent_gateway_url).cyan()
    );
    println!(
        "  Timeout:  {}s",
        state.config.agent_timeout_secs
    );
    println!();

    // System
    println!("  {}", style("── System ──").dim());
    println!(
        "  Data dir: {}",
        style(state.data_dir.display()).dim()
    );
    println!(
        "  Database: {}",
        style("SQLite (WAL mode)").dim()
    );
    println!(
        "  Sessions: {}",
        style(state.config.session_backend).dim()
    );
    println!();

    Ok(())
}

fn format_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1_500), "1.5K");
        assert_eq!(format_count(2_300_000), "2.3M");
    }
}
