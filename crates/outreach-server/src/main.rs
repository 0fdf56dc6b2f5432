//! outreach-server binary.
//!
//! Reads `outreach.toml` (or the path given with `--config`), opens the
//! configured encounter store and serves the JSON API over HTTP until
//! Ctrl-C or SIGTERM.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use outreach_core::{memory::MemoryStore, store::EncounterStore};
use outreach_server::{Backend, ServerConfig};
use outreach_store_postgres::PostgresStore;
use outreach_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Journey On outreach tracker API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "outreach.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let config = ServerConfig::load(&cli.config)?;

  match config.store.backend {
    Backend::Memory => {
      tracing::warn!("using the in-memory store; encounters are lost on exit");
      serve(&config, MemoryStore::new()).await
    }
    Backend::Sqlite => {
      let path = &config.store.path;
      let store = SqliteStore::open(path)
        .await
        .with_context(|| format!("failed to open store at {path:?}"))?;
      tracing::info!(path = %path.display(), "opened sqlite store");
      serve(&config, store).await
    }
    Backend::Postgres => {
      let pg = &config.store.postgres;
      let store = PostgresStore::connect(pg)
        .await
        .with_context(|| format!("failed to connect to {}", pg.redacted_url()))?;
      tracing::info!(database = %pg.redacted_url(), "connected to postgres store");
      serve(&config, store).await
    }
  }
}

async fn serve<S>(config: &ServerConfig, store: S) -> anyhow::Result<()>
where
  S: EncounterStore + 'static,
{
  let app = outreach_server::app(store);
  let address = config.address();

  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;
  tracing::info!("Listening on http://{address}");

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  tracing::info!("server stopped");
  Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = tokio::signal::ctrl_c().await {
      tracing::error!(error = %e, "failed to listen for Ctrl+C");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    use tokio::signal::unix::{SignalKind, signal};
    match signal(SignalKind::terminate()) {
      Ok(mut sigterm) => {
        sigterm.recv().await;
      }
      Err(e) => {
        tracing::error!(error = %e, "failed to install SIGTERM handler");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
    _ = terminate => tracing::info!("received SIGTERM, shutting down"),
  }
}
