//! [`MemoryStore`] — an [`EncounterStore`] that keeps rows in process memory.
//!
//! Nothing survives a restart. Each instance is independent, so tests can run
//! many of them side by side.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;

use crate::{
  Error, Result,
  encounter::{Encounter, EncounterPatch, NewEncounter},
  store::EncounterStore,
};

/// An in-memory encounter store.
///
/// Clones share the same rows. Writers are serialized by
/// the inner lock.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  /// Insertion order.
  rows: Arc<RwLock<Vec<Encounter>>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  // A panicking writer cannot leave a row half-written (every mutation is a
  // single push or field assignment), so a poisoned lock is still usable.
  fn read(&self) -> RwLockReadGuard<'_, Vec<Encounter>> {
    self.rows.read().unwrap_or_else(PoisonError::into_inner)
  }

  fn write(&self) -> RwLockWriteGuard<'_, Vec<Encounter>> {
    self.rows.write().unwrap_or_else(PoisonError::into_inner)
  }

  /// Newest first; rows with equal `created_at` come out latest-inserted
  /// first.
  fn newest_first<'a>(
    rows: impl DoubleEndedIterator<Item = &'a Encounter>,
  ) -> Vec<Encounter> {
    let mut out: Vec<Encounter> = rows.rev().cloned().collect();
    out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    out
  }
}

impl EncounterStore for MemoryStore {
  type Error = Error;

  async fn insert(&self, input: NewEncounter) -> Result<Encounter> {
    let encounter = input.into_encounter();
    self.write().push(encounter.clone());
    Ok(encounter)
  }

  async fn list_all(&self) -> Result<Vec<Encounter>> {
    Ok(Self::newest_first(self.read().iter()))
  }

  async fn list_by_anonymous_id(&self, anonymous_id: &str) -> Result<Vec<Encounter>> {
    let rows = self.read();
    Ok(Self::newest_first(
      rows.iter().filter(|e| e.anonymous_id == anonymous_id),
    ))
  }

  async fn get_by_id(&self, id: Uuid) -> Result<Option<Encounter>> {
    Ok(self.read().iter().find(|e| e.id == id).cloned())
  }

  async fn update_partial(
    &self,
    id: Uuid,
    patch: EncounterPatch,
  ) -> Result<Option<Encounter>> {
    let mut rows = self.write();
    let Some(encounter) = rows.iter_mut().find(|e| e.id == id) else {
      return Ok(None);
    };
    patch.apply(encounter);
    Ok(Some(encounter.clone()))
  }
}
