//! uhcsdb-explorer - interactive microstructure explorer service
//!
//! Loads micrograph metadata once, then serves live scatterplot sessions that
//! the catalog embeds in its `/visualize` page.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uhcsdb_common::db::connect_readonly;
use uhcsdb_common::Settings;
use uhcsdb_explorer::dataset::Dataset;
use uhcsdb_explorer::embedding::{list_representations, CachedEmbeddings};
use uhcsdb_explorer::{build_router, AppState};

/// Command-line arguments for uhcsdb-explorer
#[derive(Parser, Debug)]
#[command(name = "uhcsdb-explorer")]
#[command(about = "Interactive microstructure explorer")]
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
    #[arg(short, long, env = "UHCSDB_EXPLORER_BIND")]
    bind: Option<String>,

    /// Base URL browsers use to reach this service
    #[arg(long, env = "UHCSDB_EXPLORER_URL")]
    public_url: Option<String>,

    /// Catalog origin allowed to embed sessions; point clicks navigate there
    #[arg(long)]
    allowed_origin: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "uhcsdb_explorer=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting UHCSDB explorer v{} [{}] built {} ({})",
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
        settings.explorer.bind = bind;
    }
    if let Some(url) = args.public_url {
        settings.explorer.public_url = url;
    }
    if let Some(origin) = args.allowed_origin {
        settings.explorer.allowed_origin = origin;
    }
    settings.validate().context("Invalid settings")?;

    info!("Data folder: {}", settings.data_dir.display());

    let db_path = settings.database_path();
    let pool = connect_readonly(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    let dataset = Dataset::load(&pool)
        .await
        .context("Failed to load micrograph metadata")?;
    pool.close().await;

    let tsne_dir = settings.tsne_dir();
    let representations = list_representations(&tsne_dir)
        .with_context(|| format!("Failed to list {}", tsne_dir.display()))?;
    if representations.is_empty() {
        warn!(
            "No representation files in {}; sessions cannot be created",
            tsne_dir.display()
        );
    } else {
        info!("{} representations available", representations.len());
    }

    let coordinates = Arc::new(CachedEmbeddings::new(&settings));
    let bind = settings.explorer.bind.clone();
    info!("Accepting sessions from {}", settings.explorer.allowed_origin);

    let state = AppState::new(settings, dataset, coordinates, representations);
    let sessions = state.sessions.clone();
    let reaper = sessions.clone().spawn_reaper();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind to {}", bind))?;
    info!("uhcsdb-explorer listening on http://{}", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            // Open event streams end once their session is gone
            sessions.clear().await;
        })
        .await
        .context("Server error")?;

    reaper.abort();
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
