//! Error types for `folio-core`.
//!
//! Every operation of the version service reports failure through [`Error`].
//! Backend-specific errors are boxed into [`Error::Store`] or
//! [`Error::ContentBackendUnavailable`] so callers can match on the domain
//! variants without knowing which backend is in use.

use thiserror::Error;
use uuid::Uuid;

use crate::{
  content::ContentRef, document::AuthorId, mode::Mode, permission::Capability,
};

/// A type-erased backend error.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("permission denied: {author_id} may not {capability} document {document_id}")]
  PermissionDenied {
    document_id: Uuid,
    author_id:   AuthorId,
    capability:  Capability,
  },

  #[error("document not found: {0}")]
  DocumentNotFound(Uuid),

  #[error("version {version_number} of document {document_id} not found")]
  VersionNotFound {
    document_id:    Uuid,
    version_number: u64,
  },

  #[error("document is already in {0} mode")]
  NoOpTransition(Mode),

  #[error("document {0} was modified concurrently")]
  ConcurrentModificationConflict(Uuid),

  #[error("content backend unavailable: {0}")]
  ContentBackendUnavailable(#[source] BoxError),

  #[error("content {0} is missing from the content backend")]
  ContentMissing(ContentRef),

  #[error("a manual commit requires a non-empty change summary")]
  EmptyChangeSummary,

  #[error("author id must not be empty")]
  MissingAuthor,

  #[error("unknown mode: {0:?}")]
  UnknownMode(String),

  #[error("store error: {0}")]
  Store(#[source] BoxError),
}

impl Error {
  /// Box a version-store error.
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }

  /// Box a content-backend error.
  pub fn content(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::ContentBackendUnavailable(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
