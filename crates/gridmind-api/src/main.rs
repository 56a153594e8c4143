//! Gridmind CLI and REST API entry point.
//!
//! Binary name: `gmind`
//!
//! Parses CLI arguments, initializes database and services, then dispatches
//! to the appropriate command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "gmind", &mut std::io::stdout());
        return Ok(());
    }

    // The server installs its own subscriber (fmt layer plus optional OTel
    // export), so it bypasses the CLI verbosity filter below.
    if let Commands::Serve { host, port, otel } = &cli.command {
        gridmind_observe::tracing_setup::init_tracing(*otel)
            .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

        let state = AppState::init().await?;
        serve(state, host, *port).await?;

        gridmind_observe::tracing_setup::shutdown_tracing();
        return Ok(());
    }

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,gridmind=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    // Initialize application state (DB, services)
    let state = AppState::init().await?;

    match cli.command {
        Commands::Status => {
            cli::status::status(&state, cli.json).await?;
        }

        Commands::Grant { user, plan, agents } => {
            cli::grant::grant(&state, user, plan, agents, cli.json).await?;
        }

        Commands::Serve { .. } | Commands::Completions { .. } => {
            unreachable!("handled above")
        }
    }

    Ok(())
}

/// Bind the listener and run the API server until shutdown.
async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!(
        "  {} Gridmind API listening on {}",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}")).cyan()
    );
    println!(
        "  {}",
        console::style("Press Ctrl+C to stop").dim()
    );

    let router = http::router::build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    println!("\n  Server stopped.");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
