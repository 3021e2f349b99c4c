//! TODO HTTP service.
//!
//! Exits 0 after a graceful shutdown. Configuration errors, startup failures,
//! listener errors and a missed shutdown deadline are logged and exit 1.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use todo_server::config::load_config;
use todo_server::lifecycle::{signals, startup, LifecycleManager, LifecycleState};
use todo_server::observability;

#[derive(Parser)]
#[command(name = "todo-server")]
#[command(about = "TODO service with basic auth and graceful shutdown", long_about = None)]
struct Cli {
    /// Optional TOML config file. Environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("todo-server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = observability::logging::init(&config.observability) {
        eprintln!("todo-server: failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = dotenv {
        tracing::info!(error = %e, "No .env file loaded");
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "todo-server starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        store_path = %config.store.path,
        shutdown_timeout_secs = config.shutdown.timeout_secs,
        timezone = %config.observability.timezone,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => observability::metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let manager = LifecycleManager::new(Duration::from_secs(config.shutdown.timeout_secs));

    let prepared = match startup::prepare(&config).await {
        Ok(prepared) => prepared,
        Err(e) => {
            let _ = manager.state().advance(LifecycleState::Stopped);
            tracing::error!(error = %e, "Startup failed");
            std::process::exit(1);
        }
    };

    let outcome = manager
        .run(prepared.listener, prepared.app, signals::termination())
        .await;

    match outcome {
        Ok(()) => {
            prepared.pool.close().await;
            tracing::info!("Server exited gracefully");
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                state = %manager.state().current(),
                "Server failed to exit successfully"
            );
            std::process::exit(1);
        }
    }
}
