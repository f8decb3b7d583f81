//! The `VersionStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `folio-store-sqlite`).
//! Higher layers (`folio-service`, `folio-api`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  document::{Document, DocumentVersion, NewDocument, NewVersion},
  page::{Page, VersionQuery},
};

/// Result of [`VersionStore::append`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
  /// The version was written and the document head advanced.
  Appended(DocumentVersion),
  /// The document head moved since the caller read it. Nothing was written.
  Conflict { expected: u64, actual: u64 },
  DocumentNotFound,
}

/// Abstraction over a version store backend.
///
/// Versions are append-only and the store is the only component that
/// assigns version numbers. There is deliberately no delete operation:
/// erasing a whole document is an administrative concern outside this trait.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait VersionStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Create a document in [`Mode::Alpha`](crate::mode::Mode::Alpha) together
  /// with its first version, atomically.
  fn create_document(
    &self,
    input: NewDocument,
  ) -> impl Future<Output = Result<(Document, DocumentVersion), Self::Error>>
  + Send
  + '_;

  /// Retrieve a document by id. Returns `None` if not found.
  fn get_document(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Document>, Self::Error>> + Send + '_;

  /// Append a version as `current_version_number + 1`.
  ///
  /// The read of the document head, the comparison against
  /// `expected_version`, the version insert and the head update form one
  /// atomic unit. When the head is not `expected_version` nothing is written
  /// and [`AppendOutcome::Conflict`] is returned.
  fn append(
    &self,
    document_id: Uuid,
    expected_version: u64,
    version: NewVersion,
  ) -> impl Future<Output = Result<AppendOutcome, Self::Error>> + Send + '_;

  /// Retrieve one version. Returns `None` if the pair does not exist.
  fn get_version(
    &self,
    document_id: Uuid,
    version_number: u64,
  ) -> impl Future<Output = Result<Option<DocumentVersion>, Self::Error>> + Send + '_;

  /// List versions newest first. Returns `None` if the document does not
  /// exist.
  fn list_versions(
    &self,
    document_id: Uuid,
    query: VersionQuery,
  ) -> impl Future<Output = Result<Option<Page<DocumentVersion>>, Self::Error>>
  + Send
  + '_;
}
