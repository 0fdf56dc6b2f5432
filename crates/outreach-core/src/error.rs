//! Error types for `outreach-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("risk_level must be one of low, medium, high (got {0:?})")]
  InvalidRiskLevel(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
