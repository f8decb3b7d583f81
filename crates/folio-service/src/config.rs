//! Service configuration, deserialisable from the server's config file.

use std::time::Duration;

use serde::Deserialize;

/// What to do when another writer appended between our read and our write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
  /// Re-run the read-compute-append cycle once, then give up.
  #[default]
  RetryOnce,
  /// Surface the conflict immediately.
  Fail,
}

impl ConflictPolicy {
  /// Total number of append attempts this policy allows.
  pub fn attempts(self) -> usize {
    match self {
      Self::RetryOnce => 2,
      Self::Fail => 1,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
  pub conflict_policy: ConflictPolicy,
  /// Upper bound on waiting for a document's write lock.
  pub lock_timeout_ms: u64,
}

impl Default for ServiceConfig {
  fn default() -> Self {
    Self { conflict_policy: ConflictPolicy::default(), lock_timeout_ms: 5_000 }
  }
}

impl ServiceConfig {
  pub fn lock_timeout(&self) -> Duration {
    Duration::from_millis(self.lock_timeout_ms)
  }
}
