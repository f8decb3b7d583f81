//! Per-document write locks.
//!
//! Writers to the same document queue on one async mutex; writers to
//! different documents never contend. Entries are pruned once no task holds
//! or waits on them.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, PoisonError},
  time::Duration,
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// Proof that the holder is the only in-process writer of a document.
pub type DocumentGuard = OwnedMutexGuard<()>;

#[derive(Debug, Default)]
pub struct DocumentLocks {
  locks: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl DocumentLocks {
  pub fn new() -> Self { Self::default() }

  /// Wait at most `timeout` for the lock on `document_id`.
  /// Returns `None` when the wait times out.
  pub async fn acquire(
    &self,
    document_id: Uuid,
    timeout: Duration,
  ) -> Option<DocumentGuard> {
    let lock = {
      let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
      // Only the map itself references an idle lock.
      locks.retain(|_, l| Arc::strong_count(l) > 1);
      locks.entry(document_id).or_default().clone()
    };
    tokio::time::timeout(timeout, lock.lock_owned()).await.ok()
  }

  /// Number of documents with a held or awaited lock.
  pub fn active(&self) -> usize {
    self
      .locks
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .values()
      .filter(|l| Arc::strong_count(l) > 1)
      .count()
  }
}
