//! Plugdeploy CLI and REST API entry point.
//!
//! Binary name: `plugdeploy`
//!
//! Parses CLI arguments, loads configuration, then dispatches to the
//! appropriate command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;

use cli::{Cli, Commands};
use plugdeploy_infra::config::load_config;
use plugdeploy_observe::tracing_setup::{LogFormat, init_tracing, shutdown_tracing};
use plugdeploy_types::config::DeployerConfig;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,plugdeploy=debug",
        _ => "trace",
    };
    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_tracing(filter, format, cli.otel).map_err(|e| anyhow::anyhow!(e))?;

    let config = load_config(cli.config.as_deref()).await;
    tracing::debug!(bucket = %config.plugin_bucket(), local = config.local, "configuration loaded");

    let result = run(cli, config).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli, mut config: DeployerConfig) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { port, host } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            let addr = format!("{}:{}", config.server.host, config.server.port);
            let local = config.local;

            let state = AppState::init(config).await?;
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            if !cli.quiet {
                println!(
                    "  {} Plugdeploy API listening on {}",
                    console::style("⚡").bold(),
                    console::style(format!("http://{addr}")).cyan()
                );
                if local {
                    println!(
                        "  {}",
                        console::style("Local mode: authentication disabled").yellow()
                    );
                }
                println!("  {}", console::style("Press Ctrl+C to stop").dim());
            }

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            if !cli.quiet {
                println!("\n  Server stopped.");
            }
        }

        Commands::Deploy { dir } => {
            let deployer = state::build_deployer(&config);
            let walker = state::build_walker(&config);
            cli::plugin::deploy_dir(&deployer, &walker, &dir, cli.json).await?;
        }

        Commands::List => {
            let deployer = state::build_deployer(&config);
            cli::plugin::list_plugins(&deployer, cli.json).await?;
        }

        Commands::Fetch { name, dir } => {
            let deployer = state::build_deployer(&config);
            cli::plugin::fetch_plugin(&deployer, &name, &dir, cli.json).await?;
        }

        Commands::Delete { names } => {
            let deployer = state::build_deployer(&config);
            cli::plugin::delete_plugins(&deployer, &names, cli.json).await?;
        }
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
