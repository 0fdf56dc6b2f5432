//! Handlers for `GET /` and `GET /health`.

use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

pub const SERVICE_NAME: &str = "Journey On Outreach Tracker API";

#[derive(Debug, Serialize)]
pub struct Banner {
  pub message: &'static str,
}

/// `GET /`
pub async fn root() -> Json<Banner> { Json(Banner { message: SERVICE_NAME }) }

#[derive(Debug, Serialize)]
pub struct Health {
  pub status:    &'static str,
  /// RFC 3339, UTC.
  pub timestamp: String,
}

/// `GET /health` — liveness only; does not touch the store.
pub async fn health() -> Json<Health> {
  Json(Health {
    status:    "ok",
    timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
  })
}
