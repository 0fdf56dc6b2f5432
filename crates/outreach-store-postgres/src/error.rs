//! Error type for `outreach-store-postgres`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] outreach_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_postgres::Error),

  #[error("connection pool error: {0}")]
  Pool(#[from] deadpool_postgres::PoolError),

  #[error("configuration error: {0}")]
  Configuration(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
