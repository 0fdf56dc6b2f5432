//! Handlers for `/encounters` endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/encounters` | Optional `?anonymous_id=`; newest first |
//! | `POST`  | `/encounters` | Body normalized by [`body::new_encounter`]; returns 201 |
//! | `GET`   | `/encounters/{id}` | 404 if not found |
//! | `PATCH` | `/encounters/{id}` | Body validated by [`body::encounter_patch`] |

use std::sync::Arc;

use axum::{
  Json,
  extract::{
    Path, Query, State,
    rejection::{JsonRejection, PathRejection, QueryRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use outreach_core::{encounter::Encounter, store::EncounterStore};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::{body, error::ApiError};

/// Turn axum's JSON rejection (bad syntax, wrong content type) into our 400.
fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
  body
    .map(|Json(v)| v)
    .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

/// Ids that are not UUIDs (or not even valid path text) cannot name a stored
/// encounter.
fn encounter_id(raw: Result<Path<String>, PathRejection>) -> Result<Uuid, ApiError> {
  let Path(raw) = raw.map_err(|_| ApiError::NotFound)?;
  Uuid::parse_str(&raw).map_err(|_| ApiError::NotFound)
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// Exact-match filter. An empty value means no filter.
  pub anonymous_id: Option<String>,
}

/// `GET /encounters[?anonymous_id=<id>]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  query: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Encounter>>, ApiError>
where
  S: EncounterStore,
{
  let Query(params) =
    query.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
  let encounters = match params.anonymous_id.as_deref().filter(|a| !a.is_empty()) {
    Some(anonymous_id) => store.list_by_anonymous_id(anonymous_id).await,
    None => store.list_all().await,
  }
  .map_err(ApiError::store)?;

  Ok(Json(encounters))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /encounters`: returns 201 + the stored [`Encounter`].
pub async fn create<S>(
  State(store): State<Arc<S>>,
  payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: EncounterStore,
{
  let input = body::new_encounter(json_body(payload)?)?;

  let encounter = store.insert(input).await.map_err(ApiError::store)?;
  tracing::info!(
    id = %encounter.id,
    risk_level = %encounter.risk_level,
    "encounter recorded"
  );
  Ok((StatusCode::CREATED, Json(encounter)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /encounters/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  id: Result<Path<String>, PathRejection>,
) -> Result<Json<Encounter>, ApiError>
where
  S: EncounterStore,
{
  let id = encounter_id(id)?;
  let encounter = store
    .get_by_id(id)
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::NotFound)?;
  Ok(Json(encounter))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PATCH /encounters/{id}`. Body: any subset of the updatable fields.
///
/// The body is validated before the id is looked up, so an invalid body is a
/// 400 even for an unknown id.
pub async fn update_one<S>(
  State(store): State<Arc<S>>,
  id: Result<Path<String>, PathRejection>,
  payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Encounter>, ApiError>
where
  S: EncounterStore,
{
  let patch = body::encounter_patch(json_body(payload)?)?;
  let id = encounter_id(id)?;
  let fields = patch.fields();

  let encounter = store
    .update_partial(id, patch)
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::NotFound)?;
  tracing::info!(id = %encounter.id, ?fields, "encounter updated");
  Ok(Json(encounter))
}
