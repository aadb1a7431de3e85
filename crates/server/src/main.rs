mod config;
mod error;
mod keyvalue;
mod metrics;
mod routes;
mod storage;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tasklane_models::counts;

use config::Config;
use keyvalue::KeyValue;
use metrics::Metrics;
use routes::AppState;

#[derive(Parser)]
#[command(name = "tasklane", about = "Self-hosted task lists, kanban boards and sharing")]
struct Cli {
    /// Path to the config file. Defaults to ./tasklane.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (the default)
    Serve,
    /// Create or upgrade the database schema, then exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tasklane_server=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    let db = storage::init_db(&config.database.path)?;
    tracing::info!("database ready at {}", config.database.path.display());

    if matches!(cli.command, Some(Command::Migrate)) {
        tracing::info!("migrations applied");
        return Ok(());
    }

    let kv = KeyValue::connect(&config.keyvalue).await?;
    let metrics = Metrics::new(kv, config.service.enable_metrics);
    if metrics.enabled() {
        let totals = counts::totals(&db.conn())?;
        metrics
            .init_counts(totals)
            .await
            .context("Failed to seed metric counters")?;
        tracing::info!("metrics enabled at /api/v1/metrics");
    }

    let interface = config.service.interface.clone();
    let state = AppState {
        db,
        config: Arc::new(config),
        metrics,
    };
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&interface)
        .await
        .with_context(|| format!("Failed to bind {interface}"))?;
    tracing::info!("listening on {interface}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for ctrl-c: {e}");
    }
    tracing::info!("shutting down");
}
