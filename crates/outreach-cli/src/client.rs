//! Async HTTP client wrapping the outreach JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use outreach_core::encounter::Encounter;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;

/// Connection settings for the outreach API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
}

/// `GET /health` response body.
#[derive(Debug, Deserialize)]
pub struct Health {
  pub status:    String,
  pub timestamp: String,
}

#[derive(Deserialize)]
struct ErrorBody {
  error: String,
}

/// Async HTTP client for the outreach JSON REST API.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  /// Pass 2xx responses through; otherwise surface the server's `error`
  /// message, falling back to the bare status.
  async fn check(what: &str, resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    match resp.json::<ErrorBody>().await {
      Ok(body) => Err(anyhow!("{what} → {status}: {}", body.error)),
      Err(_) => Err(anyhow!("{what} → {status}")),
    }
  }

  // ── Health ────────────────────────────────────────────────────────────────

  /// `GET /health`
  pub async fn health(&self) -> Result<Health> {
    let resp = self
      .client
      .get(self.url("/health"))
      .send()
      .await
      .context("GET /health failed")?;
    Self::check("GET /health", resp)
      .await?
      .json()
      .await
      .context("deserialising health")
  }

  // ── Encounters ────────────────────────────────────────────────────────────

  /// `POST /encounters`
  pub async fn create(&self, payload: &Value) -> Result<Encounter> {
    let resp = self
      .client
      .post(self.url("/encounters"))
      .json(payload)
      .send()
      .await
      .context("POST /encounters failed")?;
    Self::check("POST /encounters", resp)
      .await?
      .json()
      .await
      .context("deserialising created encounter")
  }

  /// `GET /encounters[?anonymous_id=<id>]`
  pub async fn list(&self, anonymous_id: Option<&str>) -> Result<Vec<Encounter>> {
    let mut req = self.client.get(self.url("/encounters"));
    if let Some(anonymous_id) = anonymous_id {
      req = req.query(&[("anonymous_id", anonymous_id)]);
    }
    let resp = req.send().await.context("GET /encounters failed")?;
    Self::check("GET /encounters", resp)
      .await?
      .json()
      .await
      .context("deserialising encounters")
  }

  /// `GET /encounters/{id}`
  pub async fn get(&self, id: &str) -> Result<Encounter> {
    let path = format!("/encounters/{id}");
    let resp = self
      .client
      .get(self.url(&path))
      .send()
      .await
      .with_context(|| format!("GET {path} failed"))?;
    Self::check(&format!("GET {path}"), resp)
      .await?
      .json()
      .await
      .context("deserialising encounter")
  }

  /// `PATCH /encounters/{id}`
  pub async fn update(&self, id: &str, patch: &Value) -> Result<Encounter> {
    let path = format!("/encounters/{id}");
    let resp = self
      .client
      .patch(self.url(&path))
      .json(patch)
      .send()
      .await
      .with_context(|| format!("PATCH {path} failed"))?;
    Self::check(&format!("PATCH {path}"), resp)
      .await?
      .json()
      .await
      .context("deserialising updated encounter")
  }

  /// `GET /encounters/export` — the raw CSV document.
  pub async fn export(&self) -> Result<String> {
    let resp = self
      .client
      .get(self.url("/encounters/export"))
      .send()
      .await
      .context("GET /encounters/export failed")?;
    Self::check("GET /encounters/export", resp)
      .await?
      .text()
      .await
      .context("reading export body")
  }
}
