//! [`SqliteStore`] — the SQLite implementation of [`EncounterStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use outreach_core::{
  encounter::{Encounter, EncounterPatch, NewEncounter},
  store::EncounterStore,
};

use crate::{
  Error, Result,
  encode::{RawEncounter, encode_uuid},
  schema::{COLUMNS, SCHEMA},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An encounter store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All
/// statements run on the connection's one background thread, so writes to a
/// row are serialized.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    tracing::debug!("sqlite schema ready");
    Ok(())
  }

  /// Run `SELECT` over `encounters` with an optional `anonymous_id` filter,
  /// newest first. `rowid` breaks ties between rows created in the same
  /// microsecond.
  async fn select_newest_first(
    &self,
    anonymous_id: Option<String>,
  ) -> Result<Vec<Encounter>> {
    let raws: Vec<RawEncounter> = self
      .conn
      .call(move |conn| {
        let rows = if let Some(a) = anonymous_id {
          let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM encounters
             WHERE anonymous_id = ?1
             ORDER BY created_at DESC, rowid DESC"
          ))?;
          stmt
            .query_map(rusqlite::params![a], RawEncounter::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM encounters
             ORDER BY created_at DESC, rowid DESC"
          ))?;
          stmt
            .query_map([], RawEncounter::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEncounter::into_encounter).collect()
  }
}

// ─── EncounterStore impl ─────────────────────────────────────────────────────

impl EncounterStore for SqliteStore {
  type Error = Error;

  async fn insert(&self, input: NewEncounter) -> Result<Encounter> {
    let encounter = input.into_encounter();
    let raw = RawEncounter::from_encounter(&encounter)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO encounters (
             id, anonymous_id, created_at, updated_at, gps_lat, gps_lng,
             location_notes, risk_level, observed_conditions,
             services_requested, referrals_given, status
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
          rusqlite::params![
            raw.id,
            raw.anonymous_id,
            raw.created_at,
            raw.updated_at,
            raw.gps_lat,
            raw.gps_lng,
            raw.location_notes,
            raw.risk_level,
            raw.observed_conditions,
            raw.services_requested,
            raw.referrals_given,
            raw.status,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(encounter)
  }

  async fn list_all(&self) -> Result<Vec<Encounter>> {
    self.select_newest_first(None).await
  }

  async fn list_by_anonymous_id(&self, anonymous_id: &str) -> Result<Vec<Encounter>> {
    self.select_newest_first(Some(anonymous_id.to_owned())).await
  }

  async fn get_by_id(&self, id: Uuid) -> Result<Option<Encounter>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawEncounter> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {COLUMNS} FROM encounters WHERE id = ?1"),
            rusqlite::params![id_str],
            RawEncounter::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawEncounter::into_encounter).transpose()
  }

  async fn update_partial(
    &self,
    id: Uuid,
    patch: EncounterPatch,
  ) -> Result<Option<Encounter>> {
    let id_str = encode_uuid(id);

    // Read, patch and write back inside one transaction so `updated_at` is
    // computed from the value being replaced.
    let raw: Option<RawEncounter> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let current = tx
          .query_row(
            &format!("SELECT {COLUMNS} FROM encounters WHERE id = ?1"),
            rusqlite::params![id_str],
            RawEncounter::from_row,
          )
          .optional()?;
        let Some(current) = current else {
          return Ok(None);
        };

        let mut encounter = current.into_encounter().map_err(other)?;
        patch.apply(&mut encounter);
        let next = RawEncounter::from_encounter(&encounter).map_err(other)?;

        tx.execute(
          "UPDATE encounters SET
             updated_at = ?2, gps_lat = ?3, gps_lng = ?4, location_notes = ?5,
             risk_level = ?6, observed_conditions = ?7,
             services_requested = ?8, referrals_given = ?9, status = ?10
           WHERE id = ?1",
          rusqlite::params![
            next.id,
            next.updated_at,
            next.gps_lat,
            next.gps_lng,
            next.location_notes,
            next.risk_level,
            next.observed_conditions,
            next.services_requested,
            next.referrals_given,
            next.status,
          ],
        )?;
        tx.commit()?;

        Ok(Some(next))
      })
      .await?;

    raw.map(RawEncounter::into_encounter).transpose()
  }
}

/// Carry a decoding failure out of a `call` closure.
fn other(e: Error) -> tokio_rusqlite::Error { tokio_rusqlite::Error::Other(Box::new(e)) }
