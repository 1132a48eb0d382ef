//! uhcsdb-catalog - micrograph catalog web service
//!
//! Serves listing, detail and visual-query pages, and embeds live sessions
//! from the explorer process (which it starts and stops when managed).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uhcsdb_catalog::bridge::ExplorerClient;
use uhcsdb_catalog::similarity::{FeatureIndex, NeighborIndex};
use uhcsdb_catalog::supervisor::{ExplorerSupervisor, LaunchArgs};
use uhcsdb_catalog::{build_router, AppState};
use uhcsdb_common::db::connect_readonly;
use uhcsdb_common::Settings;

/// Command-line arguments for uhcsdb-catalog
#[derive(Parser, Debug)]
#[command(name = "uhcsdb-catalog")]
#[command(about = "Micrograph catalog web service")]
#[command(version)]
struct Args {
    /// TOML settings file
    #[arg(short, long, env = "UHCSDB_SETTINGS")]
    settings: Option<PathBuf>,

    /// Data folder (database, static images, cached projections)
    #[arg(short, long, env = "UHCSDB_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// SQLite database, relative to the data folder unless absolute
    #[arg(long)]
    database: Option<PathBuf>,

    /// Listen address
    #[arg(short, long, env = "UHCSDB_CATALOG_BIND")]
    bind: Option<String>,

    /// Explorer base URL as seen by browsers
    #[arg(long, env = "UHCSDB_EXPLORER_URL")]
    explorer_url: Option<String>,

    /// Do not start the explorer; expect it to be running already
    #[arg(long)]
    external_explorer: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "uhcsdb_catalog=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting UHCSDB catalog v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let mut settings = match &args.settings {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .context("Failed to load settings")?;

    if let Some(data_dir) = args.data_dir {
        settings.data_dir = data_dir;
    }
    if let Some(database) = args.database {
        settings.database = database;
    }
    if let Some(bind) = args.bind {
        settings.catalog.bind = bind;
    }
    if let Some(url) = args.explorer_url {
        settings.explorer.public_url = url;
    }
    if args.external_explorer {
        settings.explorer.managed = false;
    }
    settings.validate().context("Invalid settings")?;

    info!("Data folder: {}", settings.data_dir.display());

    let db_path = settings.database_path();
    let pool = connect_readonly(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    let features_path = settings.features_path();
    let index: Option<Arc<dyn NeighborIndex>> = match FeatureIndex::load(&features_path).await {
        Ok(index) => Some(Arc::new(index)),
        Err(e) => {
            warn!("Visual query disabled: {}", e);
            None
        }
    };

    let client = ExplorerClient::new(
        &settings.explorer.public_url,
        Duration::from_millis(settings.explorer.request_timeout_ms),
    )
    .context("Failed to create explorer client")?;

    let launch = LaunchArgs {
        settings_file: args.settings.clone(),
        data_dir: Some(settings.data_dir.clone()),
        database: Some(settings.database.clone()),
    };
    let supervisor = ExplorerSupervisor::new(settings.explorer.clone(), launch, client);
    info!(
        "Explorer at {} ({})",
        settings.explorer.public_url,
        if supervisor.is_managed() { "managed" } else { "external" }
    );

    let bind = settings.catalog.bind.clone();
    let state = AppState::new(pool, settings, index, supervisor);
    let explorer = state.explorer.clone();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind to {}", bind))?;
    info!("uhcsdb-catalog listening on http://{}", bind);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error");

    // Runs on every exit from serve, including errors
    explorer.shutdown().await;
    served?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
