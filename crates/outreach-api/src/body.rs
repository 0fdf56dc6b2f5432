//! Request-body normalization and validation.
//!
//! Bodies are taken as raw JSON rather than typed structs so that "field
//! absent", "field is null" and "field has the wrong type" can be told apart.
//! Everything here runs before the store is touched; a failure is always a
//! [`ApiError::BadRequest`].
//!
//! Create (`POST /encounters`), per field:
//!
//! | field | absent / null | accepted | anything else |
//! |---|---|---|---|
//! | `anonymous_id` | generated by the store | string (empty ⇒ generated) | 400 |
//! | `gps_lat`, `gps_lng` | null | number | null |
//! | `location_notes` | null | string (empty ⇒ null) | 400 |
//! | `risk_level` | `low` | `low` \| `medium` \| `high` | 400 |
//! | list fields | `[]` | array of strings | 400 |
//! | `status` | `open` | string | 400 |
//!
//! Update (`PATCH /encounters/{id}`) only looks at keys that are present.
//! `null` clears the nullable fields and is rejected for the others.

use outreach_core::encounter::{EncounterPatch, NewEncounter, RiskLevel, defaults};
use serde_json::{Map, Value};

use crate::error::ApiError;

/// Keys a `PATCH` may carry. Anything else in the body is ignored.
pub const UPDATABLE_FIELDS: [&str; 8] = [
  "gps_lat",
  "gps_lng",
  "location_notes",
  "risk_level",
  "observed_conditions",
  "services_requested",
  "referrals_given",
  "status",
];

const RISK_LEVEL_MESSAGE: &str = "risk_level must be one of low, medium, high";

fn bad(message: impl Into<String>) -> ApiError { ApiError::BadRequest(message.into()) }

fn as_object(body: Value) -> Result<Map<String, Value>, ApiError> {
  match body {
    Value::Object(map) => Ok(map),
    _ => Err(bad("request body must be a JSON object")),
  }
}

/// `Some(v)` unless the key is absent or null.
fn non_null<'a>(body: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
  body.get(key).filter(|v| !v.is_null())
}

// ─── Field parsers ───────────────────────────────────────────────────────────

fn parse_risk_level(value: &Value) -> Result<RiskLevel, ApiError> {
  value
    .as_str()
    .and_then(|s| s.parse().ok())
    .ok_or_else(|| bad(RISK_LEVEL_MESSAGE))
}

fn string_list(key: &str, value: &Value) -> Result<Vec<String>, ApiError> {
  let items = value
    .as_array()
    .ok_or_else(|| bad(format!("{key} must be an array")))?;
  items
    .iter()
    .map(|item| {
      item
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| bad(format!("{key} must be an array of strings")))
    })
    .collect()
}

fn string(key: &str, value: &Value) -> Result<String, ApiError> {
  value
    .as_str()
    .map(str::to_owned)
    .ok_or_else(|| bad(format!("{key} must be a string")))
}

/// `null` and `""` both mean "no notes"; any other non-string is rejected.
fn notes(value: &Value) -> Result<Option<String>, ApiError> {
  match value {
    Value::Null => Ok(None),
    Value::String(s) if s.is_empty() => Ok(None),
    Value::String(s) => Ok(Some(s.clone())),
    _ => Err(bad("location_notes must be a string or null")),
  }
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// Normalize and validate a `POST /encounters` body.
pub fn new_encounter(body: Value) -> Result<NewEncounter, ApiError> {
  let body = as_object(body)?;

  let anonymous_id = non_null(&body, "anonymous_id")
    .map(|v| string("anonymous_id", v))
    .transpose()?;

  let risk_level = non_null(&body, "risk_level")
    .map(parse_risk_level)
    .transpose()?
    .unwrap_or(defaults::RISK_LEVEL);

  let list = |key: &str, default: fn() -> Vec<String>| {
    non_null(&body, key)
      .map(|v| string_list(key, v))
      .transpose()
      .map(|v| v.unwrap_or_else(default))
  };
  let observed_conditions = list("observed_conditions", defaults::observed_conditions)?;
  let services_requested = list("services_requested", defaults::services_requested)?;
  let referrals_given = list("referrals_given", defaults::referrals_given)?;

  let location_notes = body
    .get("location_notes")
    .map(notes)
    .transpose()?
    .flatten();

  let status = non_null(&body, "status")
    .map(|v| string("status", v))
    .transpose()?
    .unwrap_or_else(|| defaults::STATUS.to_owned());

  Ok(NewEncounter {
    anonymous_id,
    gps_lat: body.get("gps_lat").and_then(Value::as_f64),
    gps_lng: body.get("gps_lng").and_then(Value::as_f64),
    location_notes,
    risk_level,
    observed_conditions,
    services_requested,
    referrals_given,
    status,
  })
}

// ─── Update ──────────────────────────────────────────────────────────────────

fn coordinate(key: &str, value: &Value) -> Result<Option<f64>, ApiError> {
  match value {
    Value::Null => Ok(None),
    Value::Number(n) => Ok(n.as_f64()),
    _ => Err(bad(format!("{key} must be a number or null"))),
  }
}

/// Validate a `PATCH /encounters/{id}` body into a patch holding exactly the
/// recognized keys that are present.
pub fn encounter_patch(body: Value) -> Result<EncounterPatch, ApiError> {
  let body = as_object(body)?;

  if !UPDATABLE_FIELDS.iter().any(|k| body.contains_key(*k)) {
    return Err(bad(format!(
      "nothing to update; expected at least one of {}",
      UPDATABLE_FIELDS.join(", ")
    )));
  }

  let mut patch = EncounterPatch::default();
  if let Some(v) = body.get("gps_lat") {
    patch.gps_lat = Some(coordinate("gps_lat", v)?);
  }
  if let Some(v) = body.get("gps_lng") {
    patch.gps_lng = Some(coordinate("gps_lng", v)?);
  }
  if let Some(v) = body.get("location_notes") {
    patch.location_notes = Some(notes(v)?);
  }
  if let Some(v) = body.get("risk_level") {
    patch.risk_level = Some(parse_risk_level(v)?);
  }
  if let Some(v) = body.get("observed_conditions") {
    patch.observed_conditions = Some(string_list("observed_conditions", v)?);
  }
  if let Some(v) = body.get("services_requested") {
    patch.services_requested = Some(string_list("services_requested", v)?);
  }
  if let Some(v) = body.get("referrals_given") {
    patch.referrals_given = Some(string_list("referrals_given", v)?);
  }
  if let Some(v) = body.get("status") {
    patch.status = Some(string("status", v)?);
  }
  Ok(patch)
}
