//! aperture-server - headless backend for a photography portfolio
//!
//! Serves the gallery content API and the real-time engagement event
//! stream over a single HTTP port.

use anyhow::Result;
use aperture_common::api::auth::load_shared_secret;
use aperture_common::config;
use aperture_common::db::init::{get_setting_i64, init_database};
use aperture_common::events::EventBus;
use aperture_server::{build_router, AppState};
use clap::Parser;
use tracing::info;

/// Headless gallery service
#[derive(Debug, Parser)]
#[command(name = "aperture-server", version)]
struct Cli {
    /// Root folder holding the database (overrides APERTURE_ROOT and
    /// the config file)
    #[arg(long)]
    root_folder: Option<String>,

    /// HTTP port (overrides the http_port setting)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Build identification immediately after tracing init, before any
    // database delays
    info!(
        "Starting Aperture gallery service v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder = config::resolve_root_folder(cli.root_folder.as_deref());
    config::ensure_root_folder(&root_folder)?;

    let db_path = config::database_path(&root_folder);
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path).await?;

    let shared_secret = load_shared_secret(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load shared secret: {}", e))?;
    if shared_secret == 0 {
        info!("Admin API authentication disabled (api_shared_secret = 0)");
    } else {
        info!("✓ Loaded shared secret for admin API authentication");
    }

    let capacity = get_setting_i64(&pool, "event_channel_capacity", 256).await? as usize;
    let events = EventBus::new(capacity);

    let port = match cli.port {
        Some(port) => port,
        None => get_setting_i64(&pool, "http_port", 5850).await? as u16,
    };

    let state = AppState::new(pool, events, shared_secret);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    info!("aperture-server listening on http://127.0.0.1:{}", port);
    info!("Health check: http://127.0.0.1:{}/health", port);
    info!("Event stream: http://127.0.0.1:{}/api/events", port);

    axum::serve(listener, app).await?;

    Ok(())
}
