//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings with microsecond
//! precision, so they compare correctly as text. UUIDs are stored as
//! hyphenated lowercase strings. Modes use their lowercase names.

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use folio_core::{
  content::ContentRef,
  document::{AuthorId, Document, DocumentVersion},
  mode::Mode,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// The current time at the precision the database keeps.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Mode ────────────────────────────────────────────────────────────────────

/// Same lowercase form as the wire; both come from the strum derive.
pub fn encode_mode(m: Mode) -> &'static str { m.into() }

pub fn decode_mode(s: &str) -> Result<Mode> { Ok(Mode::parse(s)?) }

// ─── Version numbers ─────────────────────────────────────────────────────────

pub fn encode_version(n: u64) -> Result<i64> {
  i64::try_from(n).map_err(|_| Error::VersionOutOfRange(n.to_string()))
}

pub fn decode_version(n: i64) -> Result<u64> {
  u64::try_from(n).map_err(|_| Error::VersionOutOfRange(n.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawVersion::from_row`].
pub const VERSION_COLUMNS: &str = "document_id, version_number, mode, previous_mode,
   is_mode_transition, content_ref, change_summary, restored_from_version,
   author_id, created_at";

/// Raw values read directly from a `document_versions` row.
pub struct RawVersion {
  pub document_id:           String,
  pub version_number:        i64,
  pub mode:                  String,
  pub previous_mode:         Option<String>,
  pub is_mode_transition:    bool,
  pub content_ref:           String,
  pub change_summary:        String,
  pub restored_from_version: Option<i64>,
  pub author_id:             String,
  pub created_at:            String,
}

impl RawVersion {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      document_id:           row.get(0)?,
      version_number:        row.get(1)?,
      mode:                  row.get(2)?,
      previous_mode:         row.get(3)?,
      is_mode_transition:    row.get(4)?,
      content_ref:           row.get(5)?,
      change_summary:        row.get(6)?,
      restored_from_version: row.get(7)?,
      author_id:             row.get(8)?,
      created_at:            row.get(9)?,
    })
  }

  pub fn into_version(self) -> Result<DocumentVersion> {
    Ok(DocumentVersion {
      document_id:           decode_uuid(&self.document_id)?,
      version_number:        decode_version(self.version_number)?,
      mode:                  decode_mode(&self.mode)?,
      previous_mode:         self.previous_mode.as_deref().map(decode_mode).transpose()?,
      is_mode_transition:    self.is_mode_transition,
      content_ref:           ContentRef::from_stored(self.content_ref),
      change_summary:        self.change_summary,
      restored_from_version: self.restored_from_version.map(decode_version).transpose()?,
      author_id:             AuthorId::new(self.author_id)?,
      created_at:            decode_dt(&self.created_at)?,
    })
  }
}

/// Column list matching [`RawDocument::from_row`].
pub const DOCUMENT_COLUMNS: &str =
  "document_id, owner_id, current_mode, current_version_number, created_at, updated_at";

/// Raw values read directly from a `documents` row.
pub struct RawDocument {
  pub document_id:            String,
  pub owner_id:               String,
  pub current_mode:           String,
  pub current_version_number: i64,
  pub created_at:             String,
  pub updated_at:             String,
}

impl RawDocument {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      document_id:            row.get(0)?,
      owner_id:               row.get(1)?,
      current_mode:           row.get(2)?,
      current_version_number: row.get(3)?,
      created_at:             row.get(4)?,
      updated_at:             row.get(5)?,
    })
  }

  pub fn into_document(self) -> Result<Document> {
    Ok(Document {
      id:                     decode_uuid(&self.document_id)?,
      owner_id:               AuthorId::new(self.owner_id)?,
      current_mode:           decode_mode(&self.current_mode)?,
      current_version_number: decode_version(self.current_version_number)?,
      created_at:             decode_dt(&self.created_at)?,
      updated_at:             decode_dt(&self.updated_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;

  #[test]
  fn timestamps_compare_as_text() {
    let a = Utc.timestamp_opt(1_700_000_000, 5_000).unwrap();
    let b = Utc.timestamp_opt(1_700_000_000, 120_000_000).unwrap();
    assert!(encode_dt(a) < encode_dt(b));
    assert_eq!(decode_dt(&encode_dt(b)).unwrap(), b);
  }

  #[test]
  fn mode_encoding_matches_core_parser() {
    for m in [Mode::Alpha, Mode::Beta, Mode::Publish, Mode::Read] {
      assert_eq!(decode_mode(encode_mode(m)).unwrap(), m);
      assert_eq!(encode_mode(m), m.as_ref());
      assert_eq!(encode_mode(m), serde_json::to_value(m).unwrap());
    }
  }

  #[test]
  fn version_numbers_beyond_i64_are_rejected() {
    assert!(encode_version(u64::MAX).is_err());
    assert!(decode_version(-1).is_err());
  }
}
