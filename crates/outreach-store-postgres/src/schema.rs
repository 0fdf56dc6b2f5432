//! SQL schema for the PostgreSQL store.
//!
//! Column names follow the `outreach_visits` table of the existing
//! deployment: `occurred_at`, `latitude`, `longitude` and `notes` hold what
//! the API calls `created_at`, `gps_lat`, `gps_lng` and `location_notes`.

/// Idempotent DDL run when the store is opened.
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS outreach_visits (
    seq                 BIGINT GENERATED ALWAYS AS IDENTITY,
    id                  UUID PRIMARY KEY,
    anonymous_id        TEXT NOT NULL,
    occurred_at         TIMESTAMPTZ NOT NULL,
    updated_at          TIMESTAMPTZ NOT NULL,
    latitude            DOUBLE PRECISION,
    longitude           DOUBLE PRECISION,
    notes               TEXT,
    risk_level          TEXT NOT NULL DEFAULT 'low'
                        CHECK (risk_level IN ('low', 'medium', 'high')),
    observed_conditions TEXT[] NOT NULL DEFAULT '{}',
    services_requested  TEXT[] NOT NULL DEFAULT '{}',
    referrals_given     TEXT[] NOT NULL DEFAULT '{}',
    status              TEXT NOT NULL DEFAULT 'open'
);

CREATE INDEX IF NOT EXISTS outreach_visits_anonymous_idx
    ON outreach_visits (anonymous_id);
CREATE INDEX IF NOT EXISTS outreach_visits_occurred_idx
    ON outreach_visits (occurred_at DESC, seq DESC);
";

/// Column list for every `SELECT` / `RETURNING`, in the order
/// [`crate::row::encounter_from_row`] reads them.
pub const COLUMNS: &str = "id, anonymous_id, occurred_at, updated_at, latitude, longitude,
   notes, risk_level, observed_conditions, services_requested,
   referrals_given, status";

