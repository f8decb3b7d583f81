//! [`VersionPager`]: walks a document's history one page at a time.

use folio_core::{
  Result,
  content::ContentBackend,
  document::DocumentVersion,
  page::{Page, VersionQuery},
  permission::Permissions,
  store::VersionStore,
};
use uuid::Uuid;

use crate::VersionService;

/// A lazy, finite history walk.
///
/// The first page pins the anchor (`as_of`) to the head at that moment, so
/// versions appended mid-walk neither shift nor duplicate rows. Call
/// [`restart`](Self::restart) to walk again from the new head.
pub struct VersionPager<'a, S, C, P> {
  service:     &'a VersionService<S, C, P>,
  document_id: Uuid,
  page_size:   u32,
  next:        Option<u32>,
  as_of:       Option<u64>,
}

impl<'a, S, C, P> VersionPager<'a, S, C, P>
where
  S: VersionStore,
  C: ContentBackend,
  P: Permissions,
{
  pub(crate) fn new(
    service: &'a VersionService<S, C, P>,
    document_id: Uuid,
    page_size: u32,
  ) -> Self {
    Self { service, document_id, page_size, next: Some(1), as_of: None }
  }

  /// Fetch the next page, or `None` once the walk is exhausted.
  pub async fn next_page(&mut self) -> Result<Option<Page<DocumentVersion>>> {
    let Some(page) = self.next else {
      return Ok(None);
    };

    let query = VersionQuery { page, page_size: self.page_size, as_of: self.as_of };
    let result = self.service.list_versions(self.document_id, query).await?;

    self.as_of = Some(result.as_of);
    self.next = result.has_more.then(|| result.page + 1);
    Ok(Some(result))
  }

  pub fn restart(&mut self) {
    self.next = Some(1);
    self.as_of = None;
  }

  /// Drain the remaining pages into one newest-first list.
  pub async fn collect_remaining(&mut self) -> Result<Vec<DocumentVersion>> {
    let mut all = Vec::new();
    while let Some(page) = self.next_page().await? {
      all.extend(page.items);
    }
    Ok(all)
  }
}
