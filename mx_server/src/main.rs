//! Meksikaner game session server.
//!
//! Serves matchmaking, dealing and real-time bidding over HTTP and
//! WebSocket, backed by PostgreSQL or an in-memory store.

use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Error};
use log::{info, warn};
use meksikaner::{
    GameManager, SessionStore,
    db::Database,
    session::MemorySessionStore,
};
use mx_server::{
    api,
    config::{ConfigOverrides, ServerConfig, StoreBackend},
    logging, metrics,
};
use pico_args::Arguments;

const HELP: &str = "\
Run a Meksikaner game session server

USAGE:
  mx_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6969]
  --db-url     URL         Database connection string  [default: env DATABASE_URL]

FLAGS:
  --memory                 Keep games in memory instead of PostgreSQL
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL             PostgreSQL connection string
  STORE_BACKEND            postgres or memory
  SESSION_AUTO_DEAL        Deal when the third seat fills [default: true]
  SESSION_CHANNEL_CAPACITY Actor and subscriber queue size [default: 100]
  METRICS_BIND             Prometheus exporter address (disabled when unset)
  A .env file in the working directory is read first.
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let overrides = ConfigOverrides {
        bind: pargs
            .opt_value_from_str::<_, SocketAddr>("--bind")
            .context("Invalid --bind address")?,
        database_url: pargs
            .opt_value_from_str("--db-url")
            .context("Invalid --db-url")?,
        memory: pargs.contains("--memory"),
    };

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        anyhow::bail!("Unexpected arguments: {:?}", remaining);
    }

    logging::init();

    let config = ServerConfig::from_env(overrides)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(Error::msg)?;
        info!("Prometheus metrics on http://{}/metrics", addr);
    }

    info!(
        "Starting Meksikaner server at {} ({} store)",
        config.bind, config.store
    );

    let (store, database): (Arc<dyn SessionStore>, Option<Database>) = match config.store {
        StoreBackend::Postgres => {
            info!("Connecting to database");
            let db = Database::connect(&config.database)
                .await
                .context("Failed to connect to database")?;
            db.migrate().await.context("Failed to run migrations")?;
            info!("Database connected and migrated");

            let store: Arc<dyn SessionStore> = Arc::new(db.session_store());
            (store, Some(db))
        }
        StoreBackend::Memory => {
            warn!("Using the in-memory store; games are lost on exit");
            let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
            (store, None)
        }
    };

    let game_manager = GameManager::new(store, config.session.clone());
    let resumed = game_manager
        .load_active_games()
        .await
        .context("Failed to resume games in bidding")?;
    info!("Server ready with {} active game(s)", resumed);
    metrics::active_games(resumed);

    let state = api::AppState::new(game_manager);
    let app = api::create_router(state.clone());

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");
    state.game_manager.shutdown().await;
    if let Some(db) = database {
        db.close().await;
    }

    Ok(())
}

/// Resolves on Ctrl+C, or never if the handler cannot be installed
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
}
