//! nmon-server: noise monitoring service
//!
//! Serves the JSON API and dashboard pages. On first start (or with
//! `--reset-data`) the database is seeded from a CSV folder or from the
//! synthetic generator.

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nmon_common::db::init_database;
use nmon_server::cli::Args;
use nmon_server::seed::seed_database;
use nmon_server::{build_router, AppState, ServiceSettings};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Resolved before tracing starts so the configured log level applies
    let config = args.load_config().context("Failed to load configuration")?;

    let level = &config.log_level;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("nmon_server={level},nmon_common={level},tower_http={level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Build identification first, before any database work
    info!(
        "Starting nmon-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match args.config_path() {
        Some(path) if path.exists() => info!("Config file: {}", path.display()),
        Some(path) => info!("No config file at {}, using defaults", path.display()),
        None => info!("No config directory on this platform, using defaults"),
    }

    config.ensure_data_folder()?;

    let db_path = config.database_path();
    info!("Database path: {}", db_path.display());
    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    seed_database(&pool, config.seed_dir.as_deref(), args.reset_data)
        .await
        .context("Failed to seed database")?;

    let settings = ServiceSettings::from(&config);
    info!(
        dedup_window_minutes = config.dedup_window_minutes,
        hotspot_default_top = settings.hotspot_default_top,
        "Service settings"
    );
    let app = build_router(AppState::new(pool.clone(), settings));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("nmon-server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    pool.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
