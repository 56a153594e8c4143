//! CLI command definitions and dispatch for the `gmind` binary.
//!
//! Uses clap derive macros for argument parsing. The CLI is intentionally
//! small: running the server, inspecting the system, and provisioning
//! entitlements. Everything conversational goes through the REST API.

pub mod grant;
pub mod status;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use uuid::Uuid;

use gridmind_types::agent::AgentKind;
use gridmind_types::plan::PlanTier;

/// Multi-tenant conversational core for a fleet of energy-domain agents.
#[derive(Parser)]
#[command(name = "gmind", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Export spans via OpenTelemetry (stdout exporter).
        #[arg(long)]
        otel: bool,
    },

    /// System status dashboard.
    Status,

    /// Provision or update a user's entitlement row.
    Grant {
        /// User UUID to provision.
        #[arg(long)]
        user: Uuid,

        /// Plan tier (basic, plus, max).
        #[arg(long)]
        plan: PlanTier,

        /// Agents to hire, comma-separated (e.g., market,pricing).
        #[arg(long, value_delimiter = ',')]
        agents: Vec<AgentKind>,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
