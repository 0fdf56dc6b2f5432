//! CSV export — `GET /encounters/export`.
//!
//! One header row, then one row per encounter, newest first. Columns follow
//! the encounter's field order and use the API field names.
//!
//! Cell encoding:
//! - timestamps: RFC 3339, microseconds, `Z` suffix
//! - null: empty cell
//! - list fields: compact JSON array text, e.g. `["wet","injured"]`
//! - quoting per RFC 4180: cells containing `,` `"` CR or LF are quoted and
//!   inner quotes doubled; rows end with CRLF

use std::{borrow::Cow, sync::Arc};

use axum::{
  extract::State,
  http::{StatusCode, header},
  response::IntoResponse,
};
use chrono::{DateTime, SecondsFormat, Utc};
use outreach_core::{encounter::Encounter, store::EncounterStore};

use crate::error::ApiError;

pub const CONTENT_TYPE: &str = "text/csv; charset=utf-8";
pub const CONTENT_DISPOSITION: &str = "attachment; filename=\"encounters.csv\"";

pub const COLUMNS: [&str; 12] = [
  "id",
  "anonymous_id",
  "created_at",
  "updated_at",
  "gps_lat",
  "gps_lng",
  "location_notes",
  "risk_level",
  "observed_conditions",
  "services_requested",
  "referrals_given",
  "status",
];

// ─── Encoding ─────────────────────────────────────────────────────────────────

fn escape(cell: &str) -> Cow<'_, str> {
  if cell.contains([',', '"', '\r', '\n']) {
    Cow::Owned(format!("\"{}\"", cell.replace('"', "\"\"")))
  } else {
    Cow::Borrowed(cell)
  }
}

fn timestamp(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

fn number(n: Option<f64>) -> String { n.map(|n| n.to_string()).unwrap_or_default() }

fn list(items: &[String]) -> String { serde_json::Value::from(items.to_vec()).to_string() }

fn push_row<'a>(out: &mut String, cells: impl IntoIterator<Item = &'a str>) {
  let mut first = true;
  for cell in cells {
    if !first {
      out.push(',');
    }
    out.push_str(&escape(cell));
    first = false;
  }
  out.push_str("\r\n");
}

/// Render `encounters` as a complete CSV document, header included.
pub fn to_csv(encounters: &[Encounter]) -> String {
  let mut out = String::new();
  push_row(&mut out, COLUMNS);

  for e in encounters {
    let cells = [
      e.id.hyphenated().to_string(),
      e.anonymous_id.clone(),
      timestamp(e.created_at),
      timestamp(e.updated_at),
      number(e.gps_lat),
      number(e.gps_lng),
      e.location_notes.clone().unwrap_or_default(),
      e.risk_level.as_str().to_owned(),
      list(&e.observed_conditions),
      list(&e.services_requested),
      list(&e.referrals_given),
      e.status.clone(),
    ];
    push_row(&mut out, cells.iter().map(String::as_str));
  }

  out
}

// ─── Handler ──────────────────────────────────────────────────────────────────

/// `GET /encounters/export` — the whole table as a CSV attachment.
pub async fn handler<S>(
  State(store): State<Arc<S>>,
) -> Result<impl IntoResponse, ApiError>
where
  S: EncounterStore,
{
  let encounters = store.list_all().await.map_err(ApiError::store)?;
  tracing::info!(rows = encounters.len(), "exporting encounters");

  Ok((
    StatusCode::OK,
    [
      (header::CONTENT_TYPE, CONTENT_TYPE),
      (header::CONTENT_DISPOSITION, CONTENT_DISPOSITION),
    ],
    to_csv(&encounters),
  ))
}
