//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`
//! suffix), so ordering by the text column is chronological. List fields are
//! stored as compact JSON. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use outreach_core::encounter::{Encounter, RiskLevel};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Lists ────────────────────────────────────────────────────────────────────

pub fn encode_list(items: &[String]) -> Result<String> {
  Ok(serde_json::to_string(items)?)
}

pub fn decode_list(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row type ────────────────────────────────────────────────────────────────

/// Raw column values of one `encounters` row, in [`crate::schema::COLUMNS`]
/// order.
#[derive(Debug)]
pub struct RawEncounter {
  pub id:                  String,
  pub anonymous_id:        String,
  pub created_at:          String,
  pub updated_at:          String,
  pub gps_lat:             Option<f64>,
  pub gps_lng:             Option<f64>,
  pub location_notes:      Option<String>,
  pub risk_level:          String,
  pub observed_conditions: String,
  pub services_requested:  String,
  pub referrals_given:     String,
  pub status:              String,
}

impl RawEncounter {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                  row.get(0)?,
      anonymous_id:        row.get(1)?,
      created_at:          row.get(2)?,
      updated_at:          row.get(3)?,
      gps_lat:             row.get(4)?,
      gps_lng:             row.get(5)?,
      location_notes:      row.get(6)?,
      risk_level:          row.get(7)?,
      observed_conditions: row.get(8)?,
      services_requested:  row.get(9)?,
      referrals_given:     row.get(10)?,
      status:              row.get(11)?,
    })
  }

  pub fn from_encounter(e: &Encounter) -> Result<Self> {
    Ok(Self {
      id:                  encode_uuid(e.id),
      anonymous_id:        e.anonymous_id.clone(),
      created_at:          encode_dt(e.created_at),
      updated_at:          encode_dt(e.updated_at),
      gps_lat:             e.gps_lat,
      gps_lng:             e.gps_lng,
      location_notes:      e.location_notes.clone(),
      risk_level:          e.risk_level.as_str().to_owned(),
      observed_conditions: encode_list(&e.observed_conditions)?,
      services_requested:  encode_list(&e.services_requested)?,
      referrals_given:     encode_list(&e.referrals_given)?,
      status:              e.status.clone(),
    })
  }

  pub fn into_encounter(self) -> Result<Encounter> {
    Ok(Encounter {
      id:                  decode_uuid(&self.id)?,
      anonymous_id:        self.anonymous_id,
      created_at:          decode_dt(&self.created_at)?,
      updated_at:          decode_dt(&self.updated_at)?,
      gps_lat:             self.gps_lat,
      gps_lng:             self.gps_lng,
      location_notes:      self.location_notes,
      risk_level:          self.risk_level.parse::<RiskLevel>()?,
      observed_conditions: decode_list(&self.observed_conditions)?,
      services_requested:  decode_list(&self.services_requested)?,
      referrals_given:     decode_list(&self.referrals_given)?,
      status:              self.status,
    })
  }
}
