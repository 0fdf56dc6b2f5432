//! The `EncounterStore` trait.
//!
//! The trait is implemented by storage backends ([`crate::memory::MemoryStore`],
//! `outreach-store-sqlite`, `outreach-store-postgres`). The HTTP layer
//! depends on this abstraction, not on any concrete backend; the server
//! binary picks one at startup.

use std::future::Future;

use uuid::Uuid;

use crate::encounter::{Encounter, EncounterPatch, NewEncounter};

/// Abstraction over an encounter store backend.
///
/// Every operation touches at most one row. There is no delete: encounters are
/// created by [`insert`](Self::insert) and only ever changed by
/// [`update_partial`](Self::update_partial).
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait EncounterStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a new encounter with a freshly generated `id`. A missing
  /// `anonymous_id` is generated; `created_at` and `updated_at` are both set
  /// to the current time. Returns the full stored record.
  fn insert(
    &self,
    input: NewEncounter,
  ) -> impl Future<Output = Result<Encounter, Self::Error>> + Send + '_;

  /// All encounters, newest `created_at` first.
  fn list_all(
    &self,
  ) -> impl Future<Output = Result<Vec<Encounter>, Self::Error>> + Send + '_;

  /// Encounters whose `anonymous_id` equals `anonymous_id` exactly, newest
  /// first.
  fn list_by_anonymous_id<'a>(
    &'a self,
    anonymous_id: &'a str,
  ) -> impl Future<Output = Result<Vec<Encounter>, Self::Error>> + Send + 'a;

  /// Retrieve an encounter by id. Returns `None` if not found.
  fn get_by_id(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Encounter>, Self::Error>> + Send + '_;

  /// Apply `patch` to the encounter with `id` and touch `updated_at`.
  ///
  /// The caller validates the patch beforehand. Returns `None`, and changes
  /// nothing, if no encounter has that id.
  fn update_partial(
    &self,
    id: Uuid,
    patch: EncounterPatch,
  ) -> impl Future<Output = Result<Option<Encounter>, Self::Error>> + Send + '_;
}
