//! JSON REST API for the outreach encounter tracker.
//!
//! Exposes an axum [`Router`] backed by any
//! [`outreach_core::store::EncounterStore`]. The router itself holds no
//! state beyond the injected store; TLS, tracing layers and the listener are
//! the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = outreach_api::api_router(Arc::new(MemoryStore::new()));
//! axum::serve(listener, app).await?;
//! ```

pub mod body;
pub mod encounters;
pub mod error;
pub mod export;
pub mod health;

use std::sync::Arc;

use axum::{Router, routing::get};
use outreach_core::store::EncounterStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: EncounterStore + 'static,
{
  Router::new()
    .route("/", get(health::root))
    .route("/health", get(health::health))
    .route(
      "/encounters",
      get(encounters::list::<S>).post(encounters::create::<S>),
    )
    // Static segment; takes precedence over `{id}`.
    .route("/encounters/export", get(export::handler::<S>))
    .route(
      "/encounters/{id}",
      get(encounters::get_one::<S>).patch(encounters::update_one::<S>),
    )
    .with_state(store)
}

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
    response::Response,
  };
  use outreach_core::{
    encounter::{Encounter, EncounterPatch, NewEncounter, RiskLevel},
    memory::MemoryStore,
  };
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  // ── Helpers ────────────────────────────────────────────────────────────────

  async fn send(
    store: &Arc<MemoryStore>,
    method: Method,
    uri: &str,
    body: Option<Value>,
  ) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    api_router(store.clone())
      .oneshot(builder.body(body).unwrap())
      .await
      .unwrap()
  }

  async fn body_bytes(resp: Response) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap()
      .to_vec()
  }

  async fn json_body(resp: Response) -> Value {
    serde_json::from_slice(&body_bytes(resp).await).unwrap()
  }

  async fn create(store: &Arc<MemoryStore>, body: Value) -> Encounter {
    let resp = send(store, Method::POST, "/encounters", Some(body)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    serde_json::from_value(json_body(resp).await).unwrap()
  }

  fn store() -> Arc<MemoryStore> { Arc::new(MemoryStore::new()) }

  // ── Root / health ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn root_returns_banner() {
    let resp = send(&store(), Method::GET, "/", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
      json_body(resp).await,
      json!({ "message": "Journey On Outreach Tracker API" })
    );
  }

  #[tokio::test]
  async fn health_reports_ok_with_timestamp() {
    let resp = send(&store(), Method::GET, "/health", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["status"], "ok");
    let ts = body["timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok(), "timestamp: {ts}");
  }

  // ── Create ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn create_with_anonymous_id_preserves_fields() {
    let s = store();
    let resp = send(
      &s,
      Method::POST,
      "/encounters",
      Some(json!({
        "anonymous_id": "a1",
        "risk_level": "medium",
        "observed_conditions": ["wet", "injured"],
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body = json_body(resp).await;
    assert_eq!(body["anonymous_id"], "a1");
    assert_eq!(body["risk_level"], "medium");
    assert_eq!(body["observed_conditions"].as_array().unwrap().len(), 2);
    assert_eq!(body["services_requested"], json!([]));
    assert_eq!(body["referrals_given"], json!([]));
    assert_eq!(body["status"], "open");
    assert_eq!(body["location_notes"], Value::Null);
    assert_eq!(body["created_at"], body["updated_at"]);
    assert!(Uuid::parse_str(body["id"].as_str().unwrap()).is_ok());
  }

  #[tokio::test]
  async fn create_without_anonymous_id_generates_one() {
    let s = store();
    let e = create(&s, json!({ "gps_lat": 1, "gps_lng": 2 })).await;

    assert_eq!(e.anonymous_id.len(), 36);
    assert!(e.anonymous_id.contains('-'));
    assert!(Uuid::parse_str(&e.anonymous_id).is_ok());
    assert_eq!(e.gps_lat, Some(1.0));
    assert_eq!(e.gps_lng, Some(2.0));
  }

  #[tokio::test]
  async fn create_returns_fresh_ids() {
    let s = store();
    let a = create(&s, json!({})).await;
    let b = create(&s, json!({})).await;
    assert_ne!(a.id, b.id);
    assert_ne!(a.anonymous_id, b.anonymous_id);
  }

  #[tokio::test]
  async fn create_with_invalid_risk_level_is_400_and_stores_nothing() {
    let s = store();
    let resp = send(
      &s,
      Method::POST,
      "/encounters",
      Some(json!({ "risk_level": "extreme" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
      json_body(resp).await,
      json!({ "error": "risk_level must be one of low, medium, high" })
    );
    assert!(s.list_all().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn create_with_non_array_list_is_400() {
    let s = store();
    for key in ["observed_conditions", "services_requested", "referrals_given"] {
      let resp =
        send(&s, Method::POST, "/encounters", Some(json!({ key: "food" }))).await;
      assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{key}");
    }
    assert!(s.list_all().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn create_with_malformed_json_is_400() {
    let req = Request::builder()
      .method(Method::POST)
      .uri("/encounters")
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from("{not json"))
      .unwrap();
    let resp = api_router(store()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(resp).await["error"].is_string());
  }

  // ── List ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn list_is_newest_first() {
    let s = store();
    let first = create(&s, json!({ "anonymous_id": "x" })).await;
    let second = create(&s, json!({ "anonymous_id": "y" })).await;

    let resp = send(&s, Method::GET, "/encounters", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let list: Vec<Encounter> = serde_json::from_value(json_body(resp).await).unwrap();
    let ids: Vec<Uuid> = list.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
  }

  #[tokio::test]
  async fn list_filters_by_anonymous_id() {
    let s = store();
    let a1 = create(&s, json!({ "anonymous_id": "person-a" })).await;
    create(&s, json!({ "anonymous_id": "person-b" })).await;
    let a2 = create(&s, json!({ "anonymous_id": "person-a" })).await;

    let resp = send(&s, Method::GET, "/encounters?anonymous_id=person-a", None).await;
    let list: Vec<Encounter> = serde_json::from_value(json_body(resp).await).unwrap();
    let ids: Vec<Uuid> = list.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![a2.id, a1.id]);

    let resp = send(&s, Method::GET, "/encounters?anonymous_id=", None).await;
    let all: Vec<Encounter> = serde_json::from_value(json_body(resp).await).unwrap();
    assert_eq!(all.len(), 3);
  }

  // ── Get one ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn get_one_returns_the_encounter() {
    let s = store();
    let e = create(&s, json!({ "location_notes": "bus shelter" })).await;

    let resp = send(&s, Method::GET, &format!("/encounters/{}", e.id), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: Encounter = serde_json::from_value(json_body(resp).await).unwrap();
    assert_eq!(fetched, e);
  }

  #[tokio::test]
  async fn get_unknown_or_malformed_id_is_404() {
    let s = store();
    for uri in [format!("/encounters/{}", Uuid::new_v4()), "/encounters/nope".into()] {
      let resp = send(&s, Method::GET, &uri, None).await;
      assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
      assert_eq!(json_body(resp).await, json!({ "error": "not found" }));
    }
  }

  #[tokio::test]
  async fn undecodable_path_id_is_json_404() {
    let s = store();
    for method in [Method::GET, Method::PATCH] {
      let body = (method == Method::PATCH).then(|| json!({ "status": "closed" }));
      let resp = send(&s, method.clone(), "/encounters/%FF", body).await;
      assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{method}");
      assert_eq!(json_body(resp).await, json!({ "error": "not found" }));
    }
  }

  #[tokio::test]
  async fn bad_query_string_is_json_400() {
    let resp = send(
      &store(),
      Method::GET,
      "/encounters?anonymous_id=a&anonymous_id=b",
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert!(body["error"].as_str().unwrap().contains("anonymous_id"), "{body}");
  }

  // ── Update ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn patch_changes_only_supplied_fields() {
    let s = store();
    let e = create(&s, json!({
      "anonymous_id": "a1",
      "gps_lat": 12.34,
      "gps_lng": 56.78,
      "location_notes": "Under the bridge",
      "observed_conditions": ["wet"],
    }))
    .await;

    let resp = send(
      &s,
      Method::PATCH,
      &format!("/encounters/{}", e.id),
      Some(json!({ "risk_level": "high", "gps_lng": null })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Encounter = serde_json::from_value(json_body(resp).await).unwrap();

    let expected = {
      let mut x = e.clone();
      EncounterPatch {
        risk_level: Some(RiskLevel::High),
        gps_lng:    Some(None),
        ..Default::default()
      }
      .apply(&mut x);
      x.updated_at = updated.updated_at;
      x
    };
    assert_eq!(updated, expected);
    assert!(updated.updated_at > e.updated_at);
    assert_eq!(s.get_by_id(e.id).await.unwrap(), Some(updated));
  }

  #[tokio::test]
  async fn patch_with_nothing_recognized_is_400() {
    let s = store();
    let e = create(&s, json!({})).await;
    let resp = send(
      &s,
      Method::PATCH,
      &format!("/encounters/{}", e.id),
      Some(json!({ "id": "something-else" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(s.get_by_id(e.id).await.unwrap(), Some(e));
  }

  #[tokio::test]
  async fn patch_with_invalid_fields_is_400_and_changes_nothing() {
    let s = store();
    let e = create(&s, json!({})).await;
    for body in [
      json!({ "risk_level": "severe" }),
      json!({ "observed_conditions": "wet" }),
      json!({ "status": "closed", "referrals_given": {} }),
    ] {
      let resp =
        send(&s, Method::PATCH, &format!("/encounters/{}", e.id), Some(body)).await;
      assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
    assert_eq!(s.get_by_id(e.id).await.unwrap(), Some(e));
  }

  #[tokio::test]
  async fn patch_unknown_id_is_404_and_changes_nothing() {
    let s = store();
    let e = create(&s, json!({})).await;
    let resp = send(
      &s,
      Method::PATCH,
      &format!("/encounters/{}", Uuid::new_v4()),
      Some(json!({ "status": "closed" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(resp).await, json!({ "error": "not found" }));
    assert_eq!(s.list_all().await.unwrap(), vec![e]);
  }

  // ── Export ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn export_is_a_csv_attachment_with_every_row() {
    let s = store();
    for anonymous_id in ["a", "b", "c"] {
      s.insert(NewEncounter {
        anonymous_id: Some(anonymous_id.into()),
        ..Default::default()
      })
      .await
      .unwrap();
    }

    let resp = send(&s, Method::GET, "/encounters/export", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
      resp.headers().get(header::CONTENT_TYPE).unwrap(),
      "text/csv; charset=utf-8"
    );
    assert_eq!(
      resp.headers().get(header::CONTENT_DISPOSITION).unwrap(),
      "attachment; filename=\"encounters.csv\""
    );

    let body = String::from_utf8(body_bytes(resp).await).unwrap();
    let lines: Vec<&str> = body.split_terminator("\r\n").collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("id,anonymous_id,created_at,updated_at,"));
    // newest first
    assert!(lines[1].split(',').nth(1) == Some("c"));
    assert!(lines[3].split(',').nth(1) == Some("a"));
  }

  // ── Store failures ─────────────────────────────────────────────────────────

  #[derive(Debug, thiserror::Error)]
  #[error("disk on fire at /var/lib/secret")]
  struct Broken;

  struct BrokenStore;

  impl EncounterStore for BrokenStore {
    type Error = Broken;

    async fn insert(&self, _: NewEncounter) -> Result<Encounter, Broken> { Err(Broken) }
    async fn list_all(&self) -> Result<Vec<Encounter>, Broken> { Err(Broken) }
    async fn list_by_anonymous_id(&self, _: &str) -> Result<Vec<Encounter>, Broken> {
      Err(Broken)
    }
    async fn get_by_id(&self, _: Uuid) -> Result<Option<Encounter>, Broken> { Err(Broken) }
    async fn update_partial(
      &self,
      _: Uuid,
      _: EncounterPatch,
    ) -> Result<Option<Encounter>, Broken> {
      Err(Broken)
    }
  }

  #[tokio::test]
  async fn store_failures_are_opaque_500s() {
    let id = Uuid::new_v4();
    let cases = [
      (Method::POST, "/encounters".to_owned(), Some(json!({}))),
      (Method::GET, "/encounters".to_owned(), None),
      (Method::GET, "/encounters?anonymous_id=a".to_owned(), None),
      (Method::GET, format!("/encounters/{id}"), None),
      (Method::PATCH, format!("/encounters/{id}"), Some(json!({ "status": "x" }))),
      (Method::GET, "/encounters/export".to_owned(), None),
    ];

    for (method, uri, body) in cases {
      let mut builder = Request::builder().method(method.clone()).uri(&uri);
      let body = match body {
        Some(v) => {
          builder = builder.header(header::CONTENT_TYPE, "application/json");
          Body::from(v.to_string())
        }
        None => Body::empty(),
      };
      let resp = api_router(Arc::new(BrokenStore))
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

      assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR, "{method} {uri}");
      assert_eq!(
        json_body(resp).await,
        json!({ "error": "Internal server error" })
      );
    }
  }
}
