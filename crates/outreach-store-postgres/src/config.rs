//! Connection settings for [`crate::PostgresStore`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where and how to connect. Deserialised from the `[store.postgres]` table
/// of the server configuration; every field has a default.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostgresConfig {
  pub host:            String,
  pub port:            u16,
  pub user:            String,
  pub password:        String,
  pub dbname:          String,
  /// Upper bound on pooled connections.
  pub max_connections: usize,
}

impl Default for PostgresConfig {
  fn default() -> Self {
    Self {
      host:            "localhost".into(),
      port:            5432,
      user:            "postgres".into(),
      password:        String::new(),
      dbname:          "outreach".into(),
      max_connections: 16,
    }
  }
}

// Never print the password.
impl fmt::Debug for PostgresConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PostgresConfig")
      .field("host", &self.host)
      .field("port", &self.port)
      .field("user", &self.user)
      .field("password", &"***")
      .field("dbname", &self.dbname)
      .field("max_connections", &self.max_connections)
      .finish()
  }
}

impl PostgresConfig {
  /// Override fields from the libpq variables `PGHOST`, `PGPORT`, `PGUSER`,
  /// `PGPASSWORD` and `PGDATABASE`, looked up through `lookup`.
  ///
  /// An unparsable `PGPORT` is reported rather than ignored.
  pub fn with_libpq_env(
    mut self,
    lookup: impl Fn(&str) -> Option<String>,
  ) -> crate::Result<Self> {
    if let Some(host) = lookup("PGHOST") {
      self.host = host;
    }
    if let Some(port) = lookup("PGPORT") {
      self.port = port.parse().map_err(|_| {
        crate::Error::Configuration(format!("PGPORT is not a port number: {port:?}"))
      })?;
    }
    if let Some(user) = lookup("PGUSER") {
      self.user = user;
    }
    if let Some(password) = lookup("PGPASSWORD") {
      self.password = password;
    }
    if let Some(dbname) = lookup("PGDATABASE") {
      self.dbname = dbname;
    }
    Ok(self)
  }

  /// The `tokio_postgres` connection configuration.
  pub fn to_pg_config(&self) -> tokio_postgres::Config {
    let mut cfg = tokio_postgres::Config::new();
    cfg
      .host(&self.host)
      .port(self.port)
      .user(&self.user)
      .dbname(&self.dbname)
      .application_name("outreach-server");
    if !self.password.is_empty() {
      cfg.password(&self.password);
    }
    cfg
  }

  /// A connection URL safe for logs (no password).
  pub fn redacted_url(&self) -> String {
    format!(
      "postgresql://{}@{}:{}/{}",
      self.user, self.host, self.port, self.dbname
    )
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use super::*;

  fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
      .iter()
      .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
      .collect();
    move |k| map.get(k).cloned()
  }

  #[test]
  fn libpq_env_overrides_fields() {
    let cfg = PostgresConfig::default()
      .with_libpq_env(env(&[
        ("PGHOST", "db.internal"),
        ("PGPORT", "6543"),
        ("PGUSER", "outreach"),
        ("PGPASSWORD", "hunter2"),
        ("PGDATABASE", "journey_on"),
      ]))
      .unwrap();

    assert_eq!(cfg.host, "db.internal");
    assert_eq!(cfg.port, 6543);
    assert_eq!(cfg.user, "outreach");
    assert_eq!(cfg.password, "hunter2");
    assert_eq!(cfg.dbname, "journey_on");
  }

  #[test]
  fn absent_env_keeps_configured_values() {
    let cfg = PostgresConfig::default().with_libpq_env(env(&[])).unwrap();
    assert_eq!(cfg, PostgresConfig::default());
  }

  #[test]
  fn bad_pgport_is_an_error() {
    let result = PostgresConfig::default().with_libpq_env(env(&[("PGPORT", "fifty")]));
    assert!(result.is_err());
  }

  #[test]
  fn password_never_appears_in_debug_or_url() {
    let cfg = PostgresConfig {
      password: "hunter2".into(),
      ..Default::default()
    };
    assert!(!format!("{cfg:?}").contains("hunter2"));
    assert!(!cfg.redacted_url().contains("hunter2"));
    assert_eq!(cfg.redacted_url(), "postgresql://postgres@localhost:5432/outreach");
  }

  #[test]
  fn pg_config_carries_connection_fields() {
    let cfg = PostgresConfig {
      host: "db".into(),
      port: 15432,
      ..Default::default()
    }
    .to_pg_config();
    assert_eq!(cfg.get_ports(), &[15432]);
    assert_eq!(cfg.get_dbname(), Some("outreach"));
    assert_eq!(cfg.get_user(), Some("postgres"));
    assert!(cfg.get_password().is_none());
  }
}
