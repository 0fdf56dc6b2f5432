//! Encounter types — one recorded street-outreach contact.
//!
//! An encounter never carries a real identity. Repeat contacts with the same
//! unidentified person are grouped by an opaque `anonymous_id`.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, clock};

// ─── Risk level ──────────────────────────────────────────────────────────────

/// The outreach worker's assessment of immediate risk.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
  #[default]
  Low,
  Medium,
  High,
}

impl RiskLevel {
  /// The value stored in the database and sent over the wire.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Low => "low",
      Self::Medium => "medium",
      Self::High => "high",
    }
  }
}

impl fmt::Display for RiskLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for RiskLevel {
  type Err = Error;

  /// Exact, case-sensitive match.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "low" => Ok(Self::Low),
      "medium" => Ok(Self::Medium),
      "high" => Ok(Self::High),
      other => Err(Error::InvalidRiskLevel(other.to_owned())),
    }
  }
}

// ─── Defaults ────────────────────────────────────────────────────────────────

/// Values applied when a create request omits a field.
///
/// | field                 | default  |
/// |-----------------------|----------|
/// | `risk_level`          | `"low"`  |
/// | `observed_conditions` | `[]`     |
/// | `services_requested`  | `[]`     |
/// | `referrals_given`     | `[]`     |
/// | `status`              | `"open"` |
pub mod defaults {
  use super::RiskLevel;

  pub const RISK_LEVEL: RiskLevel = RiskLevel::Low;
  pub const STATUS: &str = "open";

  pub fn observed_conditions() -> Vec<String> { Vec::new() }
  pub fn services_requested() -> Vec<String> { Vec::new() }
  pub fn referrals_given() -> Vec<String> { Vec::new() }
}

// ─── Encounter ───────────────────────────────────────────────────────────────

/// A stored encounter, as returned by every store operation and by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Encounter {
  /// Server-generated; never reassigned.
  pub id:                  Uuid,
  pub anonymous_id:        String,
  pub created_at:          DateTime<Utc>,
  /// Equal to `created_at` until the first update, strictly later after.
  pub updated_at:          DateTime<Utc>,
  pub gps_lat:             Option<f64>,
  pub gps_lng:             Option<f64>,
  pub location_notes:      Option<String>,
  pub risk_level:          RiskLevel,
  pub observed_conditions: Vec<String>,
  pub services_requested:  Vec<String>,
  pub referrals_given:     Vec<String>,
  /// Free-form workflow tag. Deliberately not an enum.
  pub status:              String,
}

// ─── NewEncounter ────────────────────────────────────────────────────────────

/// Input to [`crate::store::EncounterStore::insert`], already normalized.
/// `id` and timestamps are always assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEncounter {
  /// `None` (or empty) lets the store generate one.
  pub anonymous_id:        Option<String>,
  pub gps_lat:             Option<f64>,
  pub gps_lng:             Option<f64>,
  pub location_notes:      Option<String>,
  pub risk_level:          RiskLevel,
  pub observed_conditions: Vec<String>,
  pub services_requested:  Vec<String>,
  pub referrals_given:     Vec<String>,
  pub status:              String,
}

impl Default for NewEncounter {
  fn default() -> Self {
    Self {
      anonymous_id:        None,
      gps_lat:             None,
      gps_lng:             None,
      location_notes:      None,
      risk_level:          defaults::RISK_LEVEL,
      observed_conditions: defaults::observed_conditions(),
      services_requested:  defaults::services_requested(),
      referrals_given:     defaults::referrals_given(),
      status:              defaults::STATUS.to_owned(),
    }
  }
}

impl NewEncounter {
  /// Assign identity and timestamps, producing the row to persist.
  pub fn into_encounter(self) -> Encounter {
    let now = clock::now();
    let anonymous_id = self
      .anonymous_id
      .filter(|a| !a.is_empty())
      .unwrap_or_else(|| Uuid::new_v4().hyphenated().to_string());

    Encounter {
      id: Uuid::new_v4(),
      anonymous_id,
      created_at: now,
      updated_at: now,
      gps_lat: self.gps_lat,
      gps_lng: self.gps_lng,
      location_notes: self.location_notes,
      risk_level: self.risk_level,
      observed_conditions: self.observed_conditions,
      services_requested: self.services_requested,
      referrals_given: self.referrals_given,
      status: self.status,
    }
  }
}

// ─── EncounterPatch ──────────────────────────────────────────────────────────

/// A partial update. `None` means "leave untouched"; for the nullable fields
/// `Some(None)` clears the value.
///
/// Serializes with absent fields skipped, so the JSON form is exactly the
/// body of a `PATCH /encounters/{id}` request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EncounterPatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub gps_lat:             Option<Option<f64>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub gps_lng:             Option<Option<f64>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub location_notes:      Option<Option<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub risk_level:          Option<RiskLevel>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub observed_conditions: Option<Vec<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub services_requested:  Option<Vec<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub referrals_given:     Option<Vec<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status:              Option<String>,
}

impl EncounterPatch {
  /// The names of the fields this patch changes, in declaration order.
  pub fn fields(&self) -> Vec<&'static str> {
    let mut fields = Vec::new();
    if self.gps_lat.is_some() {
      fields.push("gps_lat");
    }
    if self.gps_lng.is_some() {
      fields.push("gps_lng");
    }
    if self.location_notes.is_some() {
      fields.push("location_notes");
    }
    if self.risk_level.is_some() {
      fields.push("risk_level");
    }
    if self.observed_conditions.is_some() {
      fields.push("observed_conditions");
    }
    if self.services_requested.is_some() {
      fields.push("services_requested");
    }
    if self.referrals_given.is_some() {
      fields.push("referrals_given");
    }
    if self.status.is_some() {
      fields.push("status");
    }
    fields
  }

  pub fn is_empty(&self) -> bool { self.fields().is_empty() }

  /// Apply the supplied fields to `encounter` and touch `updated_at`.
  /// Every other field, including `id` and `created_at`, is left as is.
  pub fn apply(self, encounter: &mut Encounter) {
    if let Some(v) = self.gps_lat {
      encounter.gps_lat = v;
    }
    if let Some(v) = self.gps_lng {
      encounter.gps_lng = v;
    }
    if let Some(v) = self.location_notes {
      encounter.location_notes = v;
    }
    if let Some(v) = self.risk_level {
      encounter.risk_level = v;
    }
    if let Some(v) = self.observed_conditions {
      encounter.observed_conditions = v;
    }
    if let Some(v) = self.services_requested {
      encounter.services_requested = v;
    }
    if let Some(v) = self.referrals_given {
      encounter.referrals_given = v;
    }
    if let Some(v) = self.status {
      encounter.status = v;
    }
    encounter.updated_at = clock::touch(encounter.updated_at);
  }
}
