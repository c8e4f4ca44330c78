//! callsign-lookup - member directory service
//!
//! Serves callsign lookups (HTML, JSON, JSONP) and full-replace roster
//! uploads from CSV.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use callsign_common::config::{resolve_config_path, ConfigOverrides, ServiceConfig};
use callsign_common::{MemberStore, MemoryMemberStore, SqliteMemberStore};
use callsign_lookup::api::{Authenticator, DisabledAuthenticator, HeaderAuthenticator};
use callsign_lookup::{build_router, AppState, ImportConfig};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for callsign-lookup
#[derive(Parser, Debug)]
#[command(name = "callsign-lookup")]
#[command(about = "Member directory lookup service")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "CALLSIGN_LOOKUP_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long, env = "CALLSIGN_BIND")]
    bind: Option<SocketAddr>,

    /// SQLite database file
    #[arg(short, long, env = "CALLSIGN_DATABASE")]
    database: Option<PathBuf>,

    /// Concurrent store writers during uploads
    #[arg(long, env = "CALLSIGN_WRITERS")]
    writers: Option<usize>,

    /// Write queue capacity during uploads
    #[arg(long, env = "CALLSIGN_QUEUE_CAPACITY")]
    queue_capacity: Option<usize>,

    /// Default log level when RUST_LOG is unset
    #[arg(long, env = "CALLSIGN_LOG_LEVEL")]
    log_level: Option<String>,

    /// Keep members in memory instead of SQLite (contents lost on exit)
    #[arg(long)]
    memory: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config =
        ServiceConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    config.apply(ConfigOverrides {
        bind: args.bind,
        database_path: args.database.clone(),
        writers: args.writers,
        queue_capacity: args.queue_capacity,
        log_level: args.log_level.clone(),
    });
    config.validate().context("Invalid configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "callsign_lookup={level},callsign_common={level},tower_http={level}",
                    level = config.logging.level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting callsign-lookup v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    // Config is read before the subscriber exists, so report its source here
    info!(
        "Configuration source: {:?}",
        resolve_config_path(args.config.as_deref())
    );

    let store: Arc<dyn MemberStore> = if args.memory {
        warn!("Using in-memory member store; uploads are lost on exit");
        Arc::new(MemoryMemberStore::new())
    } else {
        info!("Database path: {}", config.database.path.display());
        // One connection per writer plus headroom for concurrent lookups
        let connections =
            u32::try_from(config.import.writers.saturating_add(4)).unwrap_or(u32::MAX);
        let store = SqliteMemberStore::open(&config.database.path, connections)
            .await
            .context("Failed to open member database")?;
        Arc::new(store)
    };
    info!("Members stored: {}", store.count().await?);

    let auth: Arc<dyn Authenticator> = if config.auth.disabled {
        warn!("Upload authentication DISABLED (auth.disabled = true)");
        Arc::new(DisabledAuthenticator)
    } else {
        Arc::new(
            HeaderAuthenticator::new(&config.auth.user_header, &config.auth.login_url)
                .context("Invalid auth configuration")?,
        )
    };

    let import = ImportConfig::from(&config.import);
    info!(
        writers = import.writers,
        queue_capacity = import.queue_capacity,
        "Import write pool configured"
    );

    let state = AppState::new(store, auth, import)
        .with_max_upload_bytes(config.import.max_upload_bytes);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.server.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server.bind))?;
    info!("callsign-lookup listening on http://{}", config.server.bind);
    info!("Health check: http://{}/health", config.server.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        },
    }
}
