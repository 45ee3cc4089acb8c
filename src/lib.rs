pub mod api;
pub mod config;
pub mod constants;
pub mod db;
pub mod entities;
pub mod models;
pub mod services;
pub mod state;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub use config::Config;
use state::SharedState;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        let handle = builder
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics recorder initialized");
        Some(handle)
    } else {
        None
    };

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    match args[1].as_str() {
        "serve" | "daemon" | "-d" | "--daemon" => run_server(config, prometheus_handle).await,

        "reset-clave" => {
            if args.len() < 3 {
                println!("Usage: galponero reset-clave <username>");
                return Ok(());
            }
            cmd_reset_clave(&config, &args[2]).await
        }

        "init" | "--init" => {
            let path = Path::new("config.toml");
            if path.exists() {
                println!("config.toml already exists, leaving it untouched.");
            } else {
                config.save_to_path(path)?;
                println!("✓ Config file created. Edit config.toml and run again.");
            }
            Ok(())
        }

        "help" | "-h" | "--help" => {
            print_help();
            Ok(())
        }

        _ => {
            println!("Unknown command: {}", args[1]);
            println!();
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!("Galponero - Registro de gallos y encastes");
    println!("Record keeper for poultry breeders");
    println!();
    println!("USAGE:");
    println!("  galponero <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("  serve, daemon        Run the web server");
    println!("  reset-clave <user>   Restore a user's edit key to the default");
    println!("  init                 Create default config file");
    println!("  help                 Show this help message");
}

async fn run_server(
    config: Config,
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> anyhow::Result<()> {
    info!(
        "Galponero v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let port = config.server.port;
    let state = api::create_app_state_from_config(config, prometheus_handle).await?;
    state
        .store()
        .ping()
        .await
        .context("Database is not responding")?;
    let app = api::router(state).await;

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Web server running at http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server error")?;

    info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
    }
}

/// Operator escape hatch for a lost edit key when the web session is also
/// unavailable.
async fn cmd_reset_clave(config: &Config, username: &str) -> anyhow::Result<()> {
    let shared = Arc::new(SharedState::new(config.clone()).await?);

    let user = shared
        .store
        .get_user_by_username(username)
        .await?
        .with_context(|| format!("No such user: {username}"))?;

    shared.gate.reset_to_default(user.id).await?;

    println!("✓ Edit key for '{username}' restored to the default.");
    Ok(())
}
