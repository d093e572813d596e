//! Tournament engine HTTP server.
//!
//! Connects to PostgreSQL, builds the tournament service over the built-in
//! format catalog and serves the versioned JSON API.

use std::net::SocketAddr;
use std::sync::Arc;

use academy_tournaments::TournamentService;
use academy_tournaments::TournamentTypeCatalog;
use academy_tournaments::db::Database;
use anyhow::{Context, Error};
use at_server::{api, config::ServerConfig, logging, metrics};
use pico_args::Arguments;
use tracing::info;

const HELP: &str = "\
Run the academy tournament server

USAGE:
  at_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6969]
  --db-url     URL         Database connection string  [default: env DATABASE_URL or postgres://postgres@localhost/academy_tournaments]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL             PostgreSQL connection string
  DB_MAX_CONNECTIONS       Maximum pool size
  METRICS_BIND             Prometheus scrape address (disabled when unset)
  RUST_LOG                 Log filter (default: info,sqlx=warn,hyper=warn)
  (See .env file for all configuration options)
";

struct Args {
    bind: Option<SocketAddr>,
    database_url: Option<String>,
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
    };

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.database_url)?;
    config.validate()?;

    if let Some(metrics_bind) = config.metrics_bind {
        metrics::init_metrics(metrics_bind).map_err(anyhow::Error::msg)?;
        info!("Prometheus metrics exported at http://{}/metrics", metrics_bind);
    }

    info!("Connecting to database");
    let db = Database::new(&config.database)
        .await
        .context("Failed to connect to database")?;
    info!("Database connected successfully");

    let catalog = Arc::new(TournamentTypeCatalog::builtin());
    let formats: Vec<_> = catalog.definitions().map(|d| d.code.to_string()).collect();
    info!("Loaded {} tournament formats: {}", formats.len(), formats.join(", "));

    let service = TournamentService::new(Arc::new(db.repository()), catalog);
    let app = api::create_router(api::AppState {
        service: Arc::new(service),
    });

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
    db.close().await;

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for CTRL+C: {}", e);
    }
}
