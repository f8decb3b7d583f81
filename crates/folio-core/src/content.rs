//! The content backend: durable key→bytes storage for snapshot payloads.
//!
//! Keys are content-addressed (SHA-256 of the payload), so writing the same
//! bytes twice yields the same [`ContentRef`] and an orphaned write left by a
//! failed append is harmless garbage.

use std::{
  collections::HashMap,
  fmt,
  future::Future,
  sync::{PoisonError, RwLock},
};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// An opaque key into a [`ContentBackend`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentRef(String);

impl ContentRef {
  /// Compute the content address of `bytes`.
  pub fn digest(bytes: &[u8]) -> Self {
    Self(hex::encode(Sha256::digest(bytes)))
  }

  /// Wrap a key previously produced by a backend (e.g. read from storage).
  pub fn from_stored(key: impl Into<String>) -> Self { Self(key.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for ContentRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Abstraction over snapshot payload storage.
pub trait ContentBackend: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist `bytes` and return their key. Idempotent.
  fn put(
    &self,
    bytes: Bytes,
  ) -> impl Future<Output = Result<ContentRef, Self::Error>> + Send + '_;

  /// Fetch the bytes stored under `content_ref`, or `None` if absent.
  fn get(
    &self,
    content_ref: ContentRef,
  ) -> impl Future<Output = Result<Option<Bytes>, Self::Error>> + Send + '_;
}

// ─── In-memory backend ───────────────────────────────────────────────────────

/// A process-local [`ContentBackend`], for tests and ephemeral servers.
#[derive(Debug, Default)]
pub struct MemoryContentStore {
  blobs: RwLock<HashMap<ContentRef, Bytes>>,
}

impl MemoryContentStore {
  pub fn new() -> Self { Self::default() }

  /// Number of distinct payloads stored.
  pub fn len(&self) -> usize {
    self.blobs.read().unwrap_or_else(PoisonError::into_inner).len()
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl ContentBackend for MemoryContentStore {
  type Error = std::convert::Infallible;

  async fn put(&self, bytes: Bytes) -> Result<ContentRef, Self::Error> {
    let key = ContentRef::digest(&bytes);
    self
      .blobs
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .entry(key.clone())
      .or_insert(bytes);
    Ok(key)
  }

  async fn get(&self, content_ref: ContentRef) -> Result<Option<Bytes>, Self::Error> {
    Ok(
      self
        .blobs
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&content_ref)
        .cloned(),
    )
  }
}
