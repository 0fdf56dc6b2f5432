//! Process wiring for the outreach tracker server.
//!
//! Configuration is layered with the [`config`] crate: an optional TOML file,
//! then `OUTREACH_*` environment variables (nested keys joined with `__`,
//! e.g. `OUTREACH_STORE__BACKEND=sqlite`), then a bare `PORT`.

use std::{
  collections::HashMap,
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use axum::Router;
use outreach_core::store::EncounterStore;
use outreach_store_postgres::PostgresConfig;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:  String,
  pub port:  u16,
  pub store: StoreConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:  "0.0.0.0".into(),
      port:  3000,
      store: StoreConfig::default(),
    }
  }
}

/// Which backend to open, and its settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
  pub backend:  Backend,
  /// SQLite database file. A leading `~/` is expanded.
  pub path:     PathBuf,
  pub postgres: PostgresConfig,
}

impl Default for StoreConfig {
  fn default() -> Self {
    Self {
      backend:  Backend::Memory,
      path:     PathBuf::from("outreach.db"),
      postgres: PostgresConfig::default(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
  /// Rows live in process memory and are lost on exit.
  #[default]
  Memory,
  Sqlite,
  Postgres,
}

impl ServerConfig {
  /// Load from `file` (if it exists) and the process environment.
  pub fn load(file: &Path) -> anyhow::Result<Self> {
    Self::load_from(file, std::env::vars().collect())
  }

  /// Load from `file` (if it exists) and the variables in `env`.
  pub fn load_from(file: &Path, env: HashMap<String, String>) -> anyhow::Result<Self> {
    let port = env.get("PORT").cloned();

    let settings = config::Config::builder()
      .add_source(config::File::from(file).required(false))
      .add_source(
        config::Environment::with_prefix("OUTREACH")
          .prefix_separator("_")
          .separator("__")
          .source(Some(env.clone())),
      )
      .set_override_option("port", port)
      .context("invalid PORT")?
      .build()
      .with_context(|| format!("failed to read config file {}", file.display()))?;

    let mut config: ServerConfig = settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")?;

    config.store.postgres = config
      .store
      .postgres
      .with_libpq_env(|key| env.get(key).cloned())
      .context("invalid PG* environment")?;
    config.store.path = expand_tilde(&config.store.path, env.get("HOME").map(String::as_str));

    Ok(config)
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to `home`.
fn expand_tilde(path: &Path, home: Option<&str>) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Some(home) = home
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Application ──────────────────────────────────────────────────────────────

/// The API router over `store`, with request tracing.
pub fn app<S>(store: S) -> Router
where
  S: EncounterStore + 'static,
{
  outreach_api::api_router(Arc::new(store)).layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use std::io::Write as _;

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use outreach_core::memory::MemoryStore;
  use tower::ServiceExt as _;

  use super::*;

  fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect()
  }

  fn toml_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
  }

  #[test]
  fn missing_file_gives_defaults() {
    let config =
      ServerConfig::load_from(Path::new("/nonexistent/outreach.toml"), env(&[])).unwrap();
    assert_eq!(config, ServerConfig::default());
    assert_eq!(config.address(), "0.0.0.0:3000");
    assert_eq!(config.store.backend, Backend::Memory);
  }

  #[test]
  fn file_values_are_read() {
    let file = toml_file(
      r#"
        host = "127.0.0.1"
        port = 8080

        [store]
        backend = "postgres"

        [store.postgres]
        host   = "db.internal"
        dbname = "journey"
      "#,
    );
    let config = ServerConfig::load_from(file.path(), env(&[])).unwrap();

    assert_eq!(config.address(), "127.0.0.1:8080");
    assert_eq!(config.store.backend, Backend::Postgres);
    assert_eq!(config.store.postgres.host, "db.internal");
    assert_eq!(config.store.postgres.dbname, "journey");
    assert_eq!(config.store.postgres.port, 5432);
  }

  #[test]
  fn environment_overrides_file() {
    let file = toml_file("port = 8080\n[store]\nbackend = \"memory\"\n");
    let config = ServerConfig::load_from(
      file.path(),
      env(&[
        ("OUTREACH_STORE__BACKEND", "sqlite"),
        ("OUTREACH_STORE__PATH", "/var/lib/outreach/encounters.db"),
        ("OUTREACH_HOST", "10.0.0.5"),
      ]),
    )
    .unwrap();

    assert_eq!(config.store.backend, Backend::Sqlite);
    assert_eq!(
      config.store.path,
      PathBuf::from("/var/lib/outreach/encounters.db")
    );
    assert_eq!(config.address(), "10.0.0.5:8080");
  }

  #[test]
  fn bare_port_wins() {
    let file = toml_file("port = 8080\n");
    let config = ServerConfig::load_from(
      file.path(),
      env(&[("OUTREACH_PORT", "9000"), ("PORT", "4000")]),
    )
    .unwrap();
    assert_eq!(config.port, 4000);
  }

  #[test]
  fn libpq_variables_override_postgres_settings() {
    let config = ServerConfig::load_from(
      Path::new("/nonexistent/outreach.toml"),
      env(&[("PGHOST", "pg.example"), ("PGPORT", "6543"), ("PGDATABASE", "visits")]),
    )
    .unwrap();
    assert_eq!(config.store.postgres.host, "pg.example");
    assert_eq!(config.store.postgres.port, 6543);
    assert_eq!(config.store.postgres.dbname, "visits");
  }

  #[test]
  fn unknown_backend_is_an_error() {
    let file = toml_file("[store]\nbackend = \"mongo\"\n");
    assert!(ServerConfig::load_from(file.path(), env(&[])).is_err());
  }

  #[test]
  fn tilde_is_expanded() {
    assert_eq!(
      expand_tilde(Path::new("~/data/outreach.db"), Some("/home/outreach")),
      PathBuf::from("/home/outreach/data/outreach.db")
    );
    assert_eq!(
      expand_tilde(Path::new("~/data/outreach.db"), None),
      PathBuf::from("~/data/outreach.db")
    );
    assert_eq!(
      expand_tilde(Path::new("rel/outreach.db"), Some("/home/outreach")),
      PathBuf::from("rel/outreach.db")
    );
  }

  #[tokio::test]
  async fn app_serves_health() {
    let resp = app(MemoryStore::new())
      .oneshot(Request::get("/health").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
  }
}
