//! Swiss draft tournament server.
//!
//! Opens (or creates) the configured tournament, restarts a draft actor for
//! every scheduled draft and serves the JSON API.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Error};
use log::info;
use pico_args::Arguments;
use sd_server::{api, config::ServerConfig, logging, metrics};
use swiss_draft::{
    TournamentManager,
    db::{Database, DraftRepository, MemoryRepository},
};

const HELP: &str = "\
Run a Swiss draft tournament server

USAGE:
  sd_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:8000]
  --db-url     URL         Database connection string  [default: env DATABASE_URL, else in-memory]
  --rounds     N           Rounds per draft            [default: env ROUNDS_PER_DRAFT or 3]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  OPERATOR_TOKEN           Shared secret for operator endpoints (required)
  TOURNAMENT_NAME          Name used when the tournament is first created
  PAIRING_SEED             Fixed seed for seating and first-round order
  METRICS_BIND             Prometheus scrape address (e.g., 0.0.0.0:9090)
  (See .env file for all configuration options)
";

struct Args {
    bind: Option<SocketAddr>,
    database_url: Option<String>,
    rounds: Option<u32>,
}

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

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        database_url: pargs.opt_value_from_str("--db-url")?,
        rounds: pargs.opt_value_from_str("--rounds")?,
    };

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.database_url, args.rounds)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(|e| anyhow::anyhow!(e))?;
        info!("Prometheus metrics on http://{}/metrics", addr);
    }

    let (repository, database): (Arc<dyn DraftRepository>, Option<Database>) =
        match &config.database {
            Some(db_config) => {
                info!("Connecting to database");
                let db = Database::new(db_config)
                    .await
                    .context("Failed to connect to database")?;
                db.ensure_schema()
                    .await
                    .context("Failed to create schema")?;
                info!("Database connected successfully");
                (Arc::new(db.repository()), Some(db))
            }
            None => {
                log::warn!("DATABASE_URL not set, state lives in memory only");
                (Arc::new(MemoryRepository::new()), None)
            }
        };

    let manager = TournamentManager::open(
        repository,
        config.tournament.id,
        &config.tournament.name,
    )
    .await
    .context("Failed to open tournament")?;
    let manager = Arc::new(manager);

    let active = manager.active_draft_count().await;
    metrics::active_drafts(active);
    info!(
        "Tournament '{}' ready with {} draft(s), event round {}",
        config.tournament.name,
        active,
        manager.event_round().await
    );

    let mut state = api::AppState::new(
        manager.clone(),
        config.operator_token.as_str(),
        config.tournament.clone(),
    );
    if let Some(db) = database.clone() {
        state = state.with_database(db);
    }

    let app = api::create_router(state);

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
    manager.shutdown().await;
    if let Some(db) = database {
        db.close().await;
    }

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
}
