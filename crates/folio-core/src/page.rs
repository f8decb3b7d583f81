//! Pagination over a document's history.
//!
//! Pages are newest-first and anchored at a version number (`as_of`).
//! Because version numbers are never reused, re-requesting a page with the
//! same anchor returns the same rows even after later appends.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Parameters for [`crate::store::VersionStore::list_versions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionQuery {
  /// 1-based page index.
  pub page:      u32,
  pub page_size: u32,
  /// Only versions numbered `<= as_of` are listed. Defaults to the head.
  pub as_of:     Option<u64>,
}

impl Default for VersionQuery {
  fn default() -> Self {
    Self { page: 1, page_size: DEFAULT_PAGE_SIZE, as_of: None }
  }
}

impl VersionQuery {
  pub fn new(page: u32, page_size: u32) -> Self {
    Self { page, page_size, as_of: None }
  }

  pub fn anchored(mut self, as_of: u64) -> Self {
    self.as_of = Some(as_of);
    self
  }

  /// Clamp `page` to at least 1 and `page_size` to `1..=MAX_PAGE_SIZE`.
  pub fn normalized(self) -> Self {
    Self {
      page:      self.page.max(1),
      page_size: self.page_size.clamp(1, MAX_PAGE_SIZE),
      as_of:     self.as_of,
    }
  }

  /// Row offset of the first item on this page.
  pub fn offset(&self) -> u64 {
    u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
  }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
  pub items:     Vec<T>,
  pub page:      u32,
  pub page_size: u32,
  /// Number of items at or below the anchor.
  pub total:     u64,
  /// The anchor version; pass it back to fetch further stable pages.
  pub as_of:     u64,
  pub has_more:  bool,
}

impl<T> Page<T> {
  /// Assemble a page from the rows selected for `query`.
  pub fn new(items: Vec<T>, query: VersionQuery, total: u64, as_of: u64) -> Self {
    let has_more = query.offset() + (items.len() as u64) < total;
    Self {
      items,
      page: query.page,
      page_size: query.page_size,
      total,
      as_of,
      has_more,
    }
  }
}
