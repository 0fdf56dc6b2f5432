//! Turning command-line flags into request bodies.
//!
//! The record form mirrors what a field worker fills in on a visit: a risk
//! level, a checklist of observed conditions, optional free-text notes and an
//! optional location. Only what was actually entered is sent; the server
//! fills in the defaults.

use clap::Args;
use outreach_core::encounter::RiskLevel;
use serde_json::{Map, Value, json};
use uuid::Uuid;

/// Observed-condition tags offered on the record form. `--condition` also
/// accepts free-form tags.
pub const CONDITIONS: [&str; 5] = [
  "Visible wounds",
  "Unsteady gait",
  "Sleeping",
  "Severe exposure (cold/heat)",
  "Behavioral distress",
];

/// Flags of `outreach record`.
#[derive(Args, Debug, Clone, Default)]
pub struct RecordForm {
  /// Risk level: low, medium or high.
  #[arg(long, default_value_t = RiskLevel::Low)]
  pub risk: RiskLevel,

  /// Observed condition (repeatable). See `outreach conditions`.
  #[arg(long = "condition", value_name = "TAG")]
  pub conditions: Vec<String>,

  /// Free-text location notes. Do not enter names or other identifying details.
  #[arg(long)]
  pub notes: Option<String>,

  /// Latitude of the visit.
  #[arg(long, requires = "lng", allow_hyphen_values = true)]
  pub lat: Option<f64>,

  /// Longitude of the visit.
  #[arg(long, requires = "lat", allow_hyphen_values = true)]
  pub lng: Option<f64>,

  /// Service requested (repeatable).
  #[arg(long = "service", value_name = "SERVICE")]
  pub services: Vec<String>,

  /// Referral given (repeatable).
  #[arg(long = "referral", value_name = "REFERRAL")]
  pub referrals: Vec<String>,

  /// Link this visit to a person already seen.
  #[arg(long, conflicts_with = "new_person")]
  pub anonymous_id: Option<String>,

  /// Generate a fresh anonymous id for a person not seen before.
  #[arg(long)]
  pub new_person: bool,
}

impl RecordForm {
  /// The `POST /encounters` body.
  pub fn payload(&self) -> Value {
    let anonymous_id = match (&self.anonymous_id, self.new_person) {
      (Some(id), _) => Some(id.clone()),
      (None, true) => Some(Uuid::new_v4().to_string()),
      (None, false) => None,
    };
    let notes = self.notes.as_deref().map(str::trim).filter(|n| !n.is_empty());

    let mut body = Map::new();
    if let Some(id) = anonymous_id {
      body.insert("anonymous_id".into(), id.into());
    }
    body.insert("gps_lat".into(), json!(self.lat));
    body.insert("gps_lng".into(), json!(self.lng));
    body.insert("location_notes".into(), json!(notes));
    body.insert("risk_level".into(), self.risk.as_str().into());
    body.insert("observed_conditions".into(), json!(self.conditions));
    body.insert("services_requested".into(), json!(self.services));
    body.insert("referrals_given".into(), json!(self.referrals));
    Value::Object(body)
  }
}

/// Flags of `outreach update`. Only the flags given are sent.
#[derive(Args, Debug, Clone, Default)]
pub struct UpdateForm {
  #[arg(long)]
  pub risk: Option<RiskLevel>,

  /// Workflow status, e.g. `open`, `follow-up`, `closed`.
  #[arg(long)]
  pub status: Option<String>,

  /// Replace the location notes.
  #[arg(long, conflicts_with = "clear_notes")]
  pub notes: Option<String>,

  /// Remove the location notes.
  #[arg(long)]
  pub clear_notes: bool,

  #[arg(long, requires = "lng", allow_hyphen_values = true, conflicts_with = "clear_location")]
  pub lat: Option<f64>,

  #[arg(long, requires = "lat", allow_hyphen_values = true)]
  pub lng: Option<f64>,

  /// Remove the recorded location.
  #[arg(long)]
  pub clear_location: bool,

  /// Replace the observed conditions (repeatable).
  #[arg(long = "condition", value_name = "TAG")]
  pub conditions: Option<Vec<String>>,

  /// Replace the services requested (repeatable).
  #[arg(long = "service", value_name = "SERVICE")]
  pub services: Option<Vec<String>>,

  /// Replace the referrals given (repeatable).
  #[arg(long = "referral", value_name = "REFERRAL")]
  pub referrals: Option<Vec<String>>,
}

impl UpdateForm {
  /// The `PATCH /encounters/{id}` body, or `None` if no flag was given.
  pub fn payload(&self) -> Option<Value> {
    let mut body = Map::new();
    if let Some(risk) = self.risk {
      body.insert("risk_level".into(), risk.as_str().into());
    }
    if let Some(status) = &self.status {
      body.insert("status".into(), status.clone().into());
    }
    if let Some(notes) = &self.notes {
      body.insert("location_notes".into(), notes.clone().into());
    }
    if self.clear_notes {
      body.insert("location_notes".into(), Value::Null);
    }
    if let (Some(lat), Some(lng)) = (self.lat, self.lng) {
      body.insert("gps_lat".into(), lat.into());
      body.insert("gps_lng".into(), lng.into());
    }
    if self.clear_location {
      body.insert("gps_lat".into(), Value::Null);
      body.insert("gps_lng".into(), Value::Null);
    }
    if let Some(conditions) = &self.conditions {
      body.insert("observed_conditions".into(), json!(conditions));
    }
    if let Some(services) = &self.services {
      body.insert("services_requested".into(), json!(services));
    }
    if let Some(referrals) = &self.referrals {
      body.insert("referrals_given".into(), json!(referrals));
    }
    (!body.is_empty()).then_some(Value::Object(body))
  }
}
