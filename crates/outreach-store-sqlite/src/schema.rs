//! SQL schema for the outreach SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Rows are inserted and updated, never deleted.
CREATE TABLE IF NOT EXISTS encounters (
    id                  TEXT PRIMARY KEY,
    anonymous_id        TEXT NOT NULL,
    created_at          TEXT NOT NULL,   -- RFC 3339, microseconds, UTC 'Z'
    updated_at          TEXT NOT NULL,   -- same format; >= created_at
    gps_lat             REAL,
    gps_lng             REAL,
    location_notes      TEXT,
    risk_level          TEXT NOT NULL DEFAULT 'low'
                        CHECK (risk_level IN ('low', 'medium', 'high')),
    observed_conditions TEXT NOT NULL DEFAULT '[]',   -- JSON array of strings
    services_requested  TEXT NOT NULL DEFAULT '[]',
    referrals_given     TEXT NOT NULL DEFAULT '[]',
    status              TEXT NOT NULL DEFAULT 'open'
);

CREATE INDEX IF NOT EXISTS encounters_anonymous_idx ON encounters(anonymous_id);
CREATE INDEX IF NOT EXISTS encounters_created_idx   ON encounters(created_at);

PRAGMA user_version = 1;
";

/// Column list shared by every `SELECT`, in [`crate::encode::RawEncounter`]
/// field order.
pub const COLUMNS: &str = "id, anonymous_id, created_at, updated_at, gps_lat, gps_lng,
   location_notes, risk_level, observed_conditions, services_requested,
   referrals_given, status";
