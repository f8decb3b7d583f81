//! [`VersionService`]: create, list, get, commit, restore and transition.

use bytes::Bytes;
use folio_core::{
  Error, Result,
  content::ContentBackend,
  document::{AuthorId, Document, DocumentVersion, NewDocument, NewVersion},
  mode::Mode,
  page::{Page, VersionQuery},
  permission::{Capability, Permissions},
  store::{AppendOutcome, VersionStore},
};
use uuid::Uuid;

use crate::{ServiceConfig, VersionPager, lock::DocumentLocks};

/// The public façade of the version history.
///
/// Generic over its three collaborators so that tests and the server can
/// plug in different backends without dynamic dispatch.
pub struct VersionService<S, C, P> {
  store:       S,
  content:     C,
  permissions: P,
  locks:       DocumentLocks,
  config:      ServiceConfig,
}

impl<S, C, P> VersionService<S, C, P>
where
  S: VersionStore,
  C: ContentBackend,
  P: Permissions,
{
  pub fn new(store: S, content: C, permissions: P, config: ServiceConfig) -> Self {
    Self { store, content, permissions, locks: DocumentLocks::new(), config }
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn config(&self) -> &ServiceConfig { &self.config }

  // ── Documents ─────────────────────────────────────────────────────────────

  /// Create a document owned by `owner_id` whose version 1 holds `content`.
  pub async fn create_document(
    &self,
    owner_id: AuthorId,
    content:  Bytes,
  ) -> Result<(Document, DocumentVersion)> {
    // The id is fixed up front so the capability check can name it.
    let id = Uuid::new_v4();
    self.authorize(Capability::Write, id, &owner_id).await?;

    let content_ref = self.content.put(content).await.map_err(Error::content)?;
    let (document, first) = self
      .store
      .create_document(NewDocument { id: Some(id), owner_id, content_ref })
      .await
      .map_err(Error::store)?;

    tracing::info!(document_id = %document.id, owner = %document.owner_id, "created document");
    Ok((document, first))
  }

  pub async fn get_document(&self, document_id: Uuid) -> Result<Document> {
    self
      .store
      .get_document(document_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::DocumentNotFound(document_id))
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// One page of a document's history, newest first.
  pub async fn list_versions(
    &self,
    document_id: Uuid,
    query:       VersionQuery,
  ) -> Result<Page<DocumentVersion>> {
    self
      .store
      .list_versions(document_id, query)
      .await
      .map_err(Error::store)?
      .ok_or(Error::DocumentNotFound(document_id))
  }

  /// A lazy, restartable walk over the whole history, newest first.
  pub fn history(&self, document_id: Uuid, page_size: u32) -> VersionPager<'_, S, C, P> {
    VersionPager::new(self, document_id, page_size)
  }

  pub async fn get_version(
    &self,
    document_id:    Uuid,
    version_number: u64,
  ) -> Result<DocumentVersion> {
    self
      .store
      .get_version(document_id, version_number)
      .await
      .map_err(Error::store)?
      .ok_or(Error::VersionNotFound { document_id, version_number })
  }

  /// The snapshot bytes of one version.
  pub async fn read_content(
    &self,
    document_id:    Uuid,
    version_number: u64,
  ) -> Result<Bytes> {
    let version = self.get_version(document_id, version_number).await?;
    self
      .content
      .get(version.content_ref.clone())
      .await
      .map_err(Error::content)?
      .ok_or(Error::ContentMissing(version.content_ref))
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  /// Record a user checkpoint with new content. The mode is unchanged.
  ///
  /// Content is written before any version row. If the append then fails,
  /// the blob is left behind; the backend is content-addressed, so this is
  /// garbage rather than corruption.
  pub async fn commit(
    &self,
    document_id:    Uuid,
    content:        Bytes,
    author_id:      AuthorId,
    change_summary: &str,
  ) -> Result<DocumentVersion> {
    self.authorize(Capability::Write, document_id, &author_id).await?;

    let summary = change_summary.trim();
    if summary.is_empty() {
      return Err(Error::EmptyChangeSummary);
    }
    let summary = summary.to_owned();

    // Fail before uploading anything for an unknown document.
    self.get_document(document_id).await?;
    let content_ref = self.content.put(content).await.map_err(Error::content)?;

    self
      .append_with(document_id, |current, _| {
        Ok(NewVersion::commit(
          current,
          content_ref.clone(),
          author_id.clone(),
          summary.clone(),
        ))
      })
      .await
  }

  /// Bring back the content of `target_version_number` as a new version.
  /// The mode is unchanged and no existing version is touched.
  pub async fn restore(
    &self,
    document_id:           Uuid,
    target_version_number: u64,
    author_id:             AuthorId,
  ) -> Result<DocumentVersion> {
    self.authorize(Capability::Write, document_id, &author_id).await?;

    let target = self.get_version(document_id, target_version_number).await?;

    self
      .append_with(document_id, |current, _| {
        Ok(NewVersion::restore(current, &target, author_id.clone()))
      })
      .await
  }

  /// Move the document to `target_mode`, recording the change as its own
  /// version that shares the current content.
  pub async fn transition_mode(
    &self,
    document_id: Uuid,
    target_mode: Mode,
    author_id:   AuthorId,
  ) -> Result<DocumentVersion> {
    self.authorize(Capability::ChangeMode, document_id, &author_id).await?;

    self
      .append_with(document_id, |current, head| {
        NewVersion::transition(current, head, target_mode, author_id.clone())
      })
      .await
  }

  // ── Internals ─────────────────────────────────────────────────────────────

  async fn authorize(
    &self,
    capability:  Capability,
    document_id: Uuid,
    author_id:   &AuthorId,
  ) -> Result<()> {
    if self.permissions.allows(capability, document_id, author_id).await {
      return Ok(());
    }
    tracing::warn!(%document_id, author = %author_id, %capability, "permission denied");
    Err(Error::PermissionDenied {
      document_id,
      author_id: author_id.clone(),
      capability,
    })
  }

  /// Run one read-compute-append cycle under the document lock, repeating it
  /// as the conflict policy allows.
  ///
  /// `build` sees the document head and its newest version as read inside
  /// the cycle; an error from `build` aborts without retrying.
  async fn append_with<F>(&self, document_id: Uuid, build: F) -> Result<DocumentVersion>
  where
    F: Fn(&Document, &DocumentVersion) -> Result<NewVersion> + Send + Sync,
  {
    let attempts = self.config.conflict_policy.attempts();

    for attempt in 1..=attempts {
      let Some(_guard) = self
        .locks
        .acquire(document_id, self.config.lock_timeout())
        .await
      else {
        tracing::warn!(%document_id, attempt, "timed out waiting for document lock");
        continue;
      };

      tracing::debug!(%document_id, attempt, "acquired document lock");

      let current = self.get_document(document_id).await?;
      let head = self
        .get_version(document_id, current.current_version_number)
        .await?;
      let version = build(&current, &head)?;

      match self
        .store
        .append(document_id, current.current_version_number, version)
        .await
        .map_err(Error::store)?
      {
        AppendOutcome::Appended(appended) => {
          tracing::info!(
            %document_id,
            version = appended.version_number,
            mode = %appended.mode,
            kind = ?appended.kind(),
            author = %appended.author_id,
            "appended version"
          );
          return Ok(appended);
        }
        AppendOutcome::Conflict { expected, actual } => {
          tracing::warn!(%document_id, expected, actual, attempt, "lost version race");
        }
        AppendOutcome::DocumentNotFound => {
          return Err(Error::DocumentNotFound(document_id));
        }
      }
    }

    Err(Error::ConcurrentModificationConflict(document_id))
  }
}
