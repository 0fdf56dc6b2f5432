//! Mapping from `outreach_visits` rows to [`Encounter`].

use outreach_core::encounter::{Encounter, RiskLevel};
use tokio_postgres::Row;

use crate::Result;

/// Decode a row selected with [`crate::schema::COLUMNS`].
pub fn encounter_from_row(row: &Row) -> Result<Encounter> {
  let risk_level: String = row.try_get("risk_level")?;

  Ok(Encounter {
    id:                  row.try_get("id")?,
    anonymous_id:        row.try_get("anonymous_id")?,
    created_at:          row.try_get("occurred_at")?,
    updated_at:          row.try_get("updated_at")?,
    gps_lat:             row.try_get("latitude")?,
    gps_lng:             row.try_get("longitude")?,
    location_notes:      row.try_get("notes")?,
    risk_level:          risk_level.parse::<RiskLevel>()?,
    observed_conditions: row.try_get("observed_conditions")?,
    services_requested:  row.try_get("services_requested")?,
    referrals_given:     row.try_get("referrals_given")?,
    status:              row.try_get("status")?,
  })
}
