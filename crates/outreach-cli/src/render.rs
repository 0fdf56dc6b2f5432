//! Plain-text rendering of encounters for the terminal.

use std::fmt::Write as _;

use chrono::{DateTime, Local, Utc};
use outreach_core::encounter::Encounter;

fn local(dt: DateTime<Utc>) -> String {
  dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

fn joined(items: &[String]) -> String {
  if items.is_empty() { "-".into() } else { items.join(", ") }
}

/// One line per encounter, for `outreach list`.
pub fn summary_line(e: &Encounter) -> String {
  format!(
    "{}  {}  {:<6}  {:<9}  {}",
    e.id,
    local(e.created_at),
    e.risk_level.as_str(),
    e.status,
    e.anonymous_id,
  )
}

/// Every field, one per line, for `outreach show`.
pub fn detail(e: &Encounter) -> String {
  let mut out = String::new();
  let location = match (e.gps_lat, e.gps_lng) {
    (Some(lat), Some(lng)) => format!("{lat}, {lng}"),
    _ => "-".into(),
  };

  // Writing to a String cannot fail.
  let _ = writeln!(out, "id:                  {}", e.id);
  let _ = writeln!(out, "anonymous id:        {}", e.anonymous_id);
  let _ = writeln!(out, "recorded:            {}", local(e.created_at));
  let _ = writeln!(out, "last updated:        {}", local(e.updated_at));
  let _ = writeln!(out, "location:            {location}");
  let _ = writeln!(
    out,
    "notes:               {}",
    e.location_notes.as_deref().unwrap_or("-")
  );
  let _ = writeln!(out, "risk level:          {}", e.risk_level);
  let _ = writeln!(out, "observed conditions: {}", joined(&e.observed_conditions));
  let _ = writeln!(out, "services requested:  {}", joined(&e.services_requested));
  let _ = writeln!(out, "referrals given:     {}", joined(&e.referrals_given));
  let _ = write!(out, "status:              {}", e.status);
  out
}
