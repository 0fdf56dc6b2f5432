//! [`PostgresStore`] — the PostgreSQL implementation of [`EncounterStore`].

use chrono::{DateTime, Utc};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::{NoTls, types::ToSql};
use uuid::Uuid;

use outreach_core::{
  clock,
  encounter::{Encounter, EncounterPatch, NewEncounter},
  store::EncounterStore,
};

use crate::{
  Error, PostgresConfig, Result,
  row::encounter_from_row,
  schema::{COLUMNS, SCHEMA},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An encounter store backed by a pooled PostgreSQL connection.
///
/// Clones share the pool.
#[derive(Clone)]
pub struct PostgresStore {
  pool: Pool,
}

impl PostgresStore {
  /// Build the pool, check connectivity and create the schema.
  pub async fn connect(config: &PostgresConfig) -> Result<Self> {
    let manager = Manager::from_config(config.to_pg_config(), NoTls, ManagerConfig {
      recycling_method: RecyclingMethod::Fast,
    });
    let pool = Pool::builder(manager)
      .max_size(config.max_connections)
      .build()
      .map_err(|e| Error::Configuration(format!("failed to build pool: {e}")))?;

    let store = Self { pool };
    store.init_schema().await?;
    tracing::info!(url = %config.redacted_url(), "connected to postgres");
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    let client = self.pool.get().await?;
    client.batch_execute(SCHEMA).await?;
    Ok(())
  }

  async fn select_newest_first(
    &self,
    anonymous_id: Option<&str>,
  ) -> Result<Vec<Encounter>> {
    let client = self.pool.get().await?;
    let rows = match anonymous_id {
      Some(a) => {
        client
          .query(
            &format!(
              "SELECT {COLUMNS} FROM outreach_visits
               WHERE anonymous_id = $1
               ORDER BY occurred_at DESC, seq DESC"
            ),
            &[&a],
          )
          .await?
      }
      None => {
        client
          .query(
            &format!(
              "SELECT {COLUMNS} FROM outreach_visits
               ORDER BY occurred_at DESC, seq DESC"
            ),
            &[],
          )
          .await?
      }
    };
    rows.iter().map(encounter_from_row).collect()
  }
}

// ─── Partial update statement ────────────────────────────────────────────────

type Param = Box<dyn ToSql + Sync + Send>;

/// Build `UPDATE ... SET <supplied columns> ... RETURNING` for `patch`.
///
/// `updated_at` is moved to `max(now, updated_at + 1µs)` in the same
/// statement, so it strictly increases even if two updates land within the
/// same microsecond. The id is always the last parameter.
fn update_statement(
  id: Uuid,
  patch: EncounterPatch,
  now: DateTime<Utc>,
) -> (String, Vec<Param>) {
  let mut sets: Vec<String> = Vec::new();
  let mut params: Vec<Param> = Vec::new();

  let mut push = |column: &str, value: Param| {
    params.push(value);
    sets.push(format!("{column} = ${}", params.len()));
  };

  if let Some(v) = patch.gps_lat {
    push("latitude", Box::new(v));
  }
  if let Some(v) = patch.gps_lng {
    push("longitude", Box::new(v));
  }
  if let Some(v) = patch.location_notes {
    push("notes", Box::new(v));
  }
  if let Some(v) = patch.risk_level {
    push("risk_level", Box::new(v.as_str().to_owned()));
  }
  if let Some(v) = patch.observed_conditions {
    push("observed_conditions", Box::new(v));
  }
  if let Some(v) = patch.services_requested {
    push("services_requested", Box::new(v));
  }
  if let Some(v) = patch.referrals_given {
    push("referrals_given", Box::new(v));
  }
  if let Some(v) = patch.status {
    push("status", Box::new(v));
  }

  params.push(Box::new(now));
  sets.push(format!(
    "updated_at = GREATEST(${}, updated_at + interval '1 microsecond')",
    params.len()
  ));

  params.push(Box::new(id));
  let sql = format!(
    "UPDATE outreach_visits SET {} WHERE id = ${} RETURNING {COLUMNS}",
    sets.join(", "),
    params.len()
  );
  (sql, params)
}

// ─── EncounterStore impl ─────────────────────────────────────────────────────

impl EncounterStore for PostgresStore {
  type Error = Error;

  async fn insert(&self, input: NewEncounter) -> Result<Encounter> {
    let e = input.into_encounter();
    let risk_level = e.risk_level.as_str();

    let client = self.pool.get().await?;
    client
      .execute(
        "INSERT INTO outreach_visits (
           id, anonymous_id, occurred_at, updated_at, latitude, longitude,
           notes, risk_level, observed_conditions, services_requested,
           referrals_given, status
         ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        &[
          &e.id,
          &e.anonymous_id,
          &e.created_at,
          &e.updated_at,
          &e.gps_lat,
          &e.gps_lng,
          &e.location_notes,
          &risk_level,
          &e.observed_conditions,
          &e.services_requested,
          &e.referrals_given,
          &e.status,
        ],
      )
      .await?;

    Ok(e)
  }

  async fn list_all(&self) -> Result<Vec<Encounter>> {
    self.select_newest_first(None).await
  }

  async fn list_by_anonymous_id(&self, anonymous_id: &str) -> Result<Vec<Encounter>> {
    self.select_newest_first(Some(anonymous_id)).await
  }

  async fn get_by_id(&self, id: Uuid) -> Result<Option<Encounter>> {
    let client = self.pool.get().await?;
    let row = client
      .query_opt(
        &format!("SELECT {COLUMNS} FROM outreach_visits WHERE id = $1"),
        &[&id],
      )
      .await?;
    row.as_ref().map(encounter_from_row).transpose()
  }

  async fn update_partial(
    &self,
    id: Uuid,
    patch: EncounterPatch,
  ) -> Result<Option<Encounter>> {
    let (sql, params) = update_statement(id, patch, clock::now());
    let refs: Vec<&(dyn ToSql + Sync)> = params
      .iter()
      .map(|p| &**p as &(dyn ToSql + Sync))
      .collect();

    let client = self.pool.get().await?;
    let row = client.query_opt(&sql, &refs).await?;
    row.as_ref().map(encounter_from_row).transpose()
  }
}
