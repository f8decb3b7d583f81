//! Documents and their immutable versions.
//!
//! A document is a thin envelope holding the head of its history. Every
//! change, whether a manual commit, a mode transition or a restore, is
//! recorded as a new [`DocumentVersion`]; versions are never updated or
//! deleted.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, content::ContentRef, mode::Mode};

/// Change summary recorded on a document's first version.
pub const INITIAL_SUMMARY: &str = "Initial version";

// ─── Identity ────────────────────────────────────────────────────────────────

/// An external user identity. Opaque to this crate, but never empty: every
/// version has an accountable author.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AuthorId(String);

impl AuthorId {
  pub fn new(id: impl Into<String>) -> Result<Self> {
    let id = id.into();
    if id.trim().is_empty() {
      return Err(Error::MissingAuthor);
    }
    Ok(Self(id))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl TryFrom<String> for AuthorId {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { Self::new(s) }
}

impl From<AuthorId> for String {
  fn from(id: AuthorId) -> Self { id.0 }
}

impl fmt::Display for AuthorId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── Document ────────────────────────────────────────────────────────────────

/// One editable work. `current_version_number` and `current_mode` always
/// mirror the newest version and are only advanced by an append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
  pub id:                     Uuid,
  pub owner_id:               AuthorId,
  pub current_mode:           Mode,
  pub current_version_number: u64,
  pub created_at:             DateTime<Utc>,
  /// Timestamp of the newest version.
  pub updated_at:             DateTime<Utc>,
}

// ─── DocumentVersion ─────────────────────────────────────────────────────────

/// An immutable snapshot. Once appended, no field is ever updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentVersion {
  pub document_id:           Uuid,
  pub version_number:        u64,
  /// Mode in effect as of this version.
  pub mode:                  Mode,
  /// Mode immediately before this version; `None` only for version 1.
  pub previous_mode:         Option<Mode>,
  pub is_mode_transition:    bool,
  pub content_ref:           ContentRef,
  pub change_summary:        String,
  /// Set when this version copies the content of an earlier one.
  pub restored_from_version: Option<u64>,
  pub author_id:             AuthorId,
  pub created_at:            DateTime<Utc>,
}

/// Why a version exists, derived from its stored fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionKind {
  Initial,
  Commit,
  Transition,
  Restore,
}

impl DocumentVersion {
  pub fn kind(&self) -> VersionKind {
    if self.is_mode_transition {
      VersionKind::Transition
    } else if self.restored_from_version.is_some() {
      VersionKind::Restore
    } else if self.previous_mode.is_none() {
      VersionKind::Initial
    } else {
      VersionKind::Commit
    }
  }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::VersionStore::create_document`].
/// The store assigns timestamps and writes version 1 in [`Mode::Alpha`].
#[derive(Debug, Clone)]
pub struct NewDocument {
  /// Caller-supplied id; the store generates one when `None`.
  pub id:          Option<Uuid>,
  pub owner_id:    AuthorId,
  pub content_ref: ContentRef,
}

/// Input to [`crate::store::VersionStore::append`].
/// `version_number` and `created_at` are always set by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVersion {
  pub mode:                  Mode,
  pub previous_mode:         Option<Mode>,
  pub is_mode_transition:    bool,
  pub content_ref:           ContentRef,
  pub change_summary:        String,
  pub author_id:             AuthorId,
  pub restored_from_version: Option<u64>,
}

impl NewVersion {
  /// A manual commit: new content, mode unchanged.
  pub fn commit(
    current: &Document,
    content_ref: ContentRef,
    author_id: AuthorId,
    change_summary: String,
  ) -> Self {
    Self {
      mode: current.current_mode,
      previous_mode: Some(current.current_mode),
      is_mode_transition: false,
      content_ref,
      change_summary,
      author_id,
      restored_from_version: None,
    }
  }

  /// A restore: the target's content by reference, mode unchanged.
  pub fn restore(
    current: &Document,
    target: &DocumentVersion,
    author_id: AuthorId,
  ) -> Self {
    Self {
      mode: current.current_mode,
      previous_mode: Some(current.current_mode),
      is_mode_transition: false,
      content_ref: target.content_ref.clone(),
      change_summary: format!("Restored from version {}", target.version_number),
      author_id,
      restored_from_version: Some(target.version_number),
    }
  }

  /// A mode transition: the head version's content, new mode.
  pub fn transition(
    current: &Document,
    head: &DocumentVersion,
    target: Mode,
    author_id: AuthorId,
  ) -> Result<Self> {
    let transition = current.current_mode.transition_to(target)?;
    Ok(Self {
      mode: transition.to,
      previous_mode: Some(transition.from),
      is_mode_transition: true,
      content_ref: head.content_ref.clone(),
      change_summary: transition.summary(),
      author_id,
      restored_from_version: None,
    })
  }
}
