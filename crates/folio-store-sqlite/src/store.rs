//! [`SqliteStore`], the SQLite implementation of [`VersionStore`].

use std::{path::Path, time::Duration};

use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use folio_core::{
  document::{Document, DocumentVersion, INITIAL_SUMMARY, NewDocument, NewVersion},
  mode::Mode,
  page::{Page, VersionQuery},
  store::{AppendOutcome, VersionStore},
};

use crate::{
  Result,
  encode::{
    DOCUMENT_COLUMNS, RawDocument, RawVersion, VERSION_COLUMNS, decode_dt,
    decode_version, encode_dt, encode_mode, encode_uuid, encode_version, now,
  },
  schema::SCHEMA,
};

/// How long a write waits on a lock held by another connection (e.g. another
/// process sharing the database file) before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Folio version store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

/// What happened inside the append transaction, before decoding.
enum RawAppend {
  Appended { version_number: i64, created_at: String },
  Conflict { actual: i64 },
  DocumentNotFound,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mainly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── VersionStore impl ───────────────────────────────────────────────────────

impl VersionStore for SqliteStore {
  type Error = crate::Error;

  async fn create_document(
    &self,
    input: NewDocument,
  ) -> Result<(Document, DocumentVersion)> {
    let created_at = now();
    let document = Document {
      id:                     input.id.unwrap_or_else(Uuid::new_v4),
      owner_id:               input.owner_id,
      current_mode:           Mode::Alpha,
      current_version_number: 1,
      created_at,
      updated_at:             created_at,
    };
    let version = DocumentVersion {
      document_id:           document.id,
      version_number:        1,
      mode:                  Mode::Alpha,
      previous_mode:         None,
      is_mode_transition:    false,
      content_ref:           input.content_ref,
      change_summary:        INITIAL_SUMMARY.to_owned(),
      restored_from_version: None,
      author_id:             document.owner_id.clone(),
      created_at,
    };

    let id_str      = encode_uuid(document.id);
    let owner_str   = document.owner_id.to_string();
    let mode_str    = encode_mode(Mode::Alpha);
    let at_str      = encode_dt(created_at);
    let content_str = version.content_ref.to_string();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO documents (
             document_id, owner_id, current_mode, current_version_number,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, 1, ?4, ?4)",
          rusqlite::params![id_str, owner_str, mode_str, at_str],
        )?;
        tx.execute(
          "INSERT INTO document_versions (
             document_id, version_number, mode, previous_mode,
             is_mode_transition, content_ref, change_summary,
             restored_from_version, author_id, created_at
           ) VALUES (?1, 1, ?2, NULL, 0, ?3, ?4, NULL, ?5, ?6)",
          rusqlite::params![
            id_str,
            mode_str,
            content_str,
            INITIAL_SUMMARY,
            owner_str,
            at_str,
          ],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok((document, version))
  }

  async fn get_document(&self, id: Uuid) -> Result<Option<Document>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawDocument> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE document_id = ?1"),
              rusqlite::params![id_str],
              RawDocument::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawDocument::into_document).transpose()
  }

  async fn append(
    &self,
    document_id:      Uuid,
    expected_version: u64,
    version:          NewVersion,
  ) -> Result<AppendOutcome> {
    let id_str        = encode_uuid(document_id);
    let expected      = encode_version(expected_version)?;
    let mode_str      = encode_mode(version.mode);
    let prev_str      = version.previous_mode.map(encode_mode);
    let content_str   = version.content_ref.to_string();
    let summary       = version.change_summary.clone();
    let restored      = version.restored_from_version.map(encode_version).transpose()?;
    let author_str    = version.author_id.to_string();
    let now_str       = encode_dt(now());
    let is_transition = version.is_mode_transition;

    let raw = self
      .conn
      .call(move |conn| {
        // IMMEDIATE takes the write lock up front, so the head read below
        // cannot be invalidated before the insert.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let head: Option<(i64, String)> = tx
          .query_row(
            "SELECT current_version_number, updated_at
             FROM documents WHERE document_id = ?1",
            rusqlite::params![id_str],
            |r| Ok((r.get(0)?, r.get(1)?)),
          )
          .optional()?;

        let Some((current, updated_at)) = head else {
          return Ok(RawAppend::DocumentNotFound);
        };
        if current != expected {
          return Ok(RawAppend::Conflict { actual: current });
        }

        let next = current + 1;
        // Keep created_at non-decreasing even if the wall clock steps back.
        let created_at = if now_str > updated_at { now_str } else { updated_at };

        tx.execute(
          "INSERT INTO document_versions (
             document_id, version_number, mode, previous_mode,
             is_mode_transition, content_ref, change_summary,
             restored_from_version, author_id, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            id_str,
            next,
            mode_str,
            prev_str,
            is_transition,
            content_str,
            summary,
            restored,
            author_str,
            created_at,
          ],
        )?;
        tx.execute(
          "UPDATE documents
           SET current_version_number = ?1, current_mode = ?2, updated_at = ?3
           WHERE document_id = ?4",
          rusqlite::params![next, mode_str, created_at, id_str],
        )?;
        tx.commit()?;

        Ok(RawAppend::Appended { version_number: next, created_at })
      })
      .await?;

    Ok(match raw {
      RawAppend::Appended { version_number, created_at } => {
        AppendOutcome::Appended(DocumentVersion {
          document_id,
          version_number: decode_version(version_number)?,
          mode: version.mode,
          previous_mode: version.previous_mode,
          is_mode_transition: version.is_mode_transition,
          content_ref: version.content_ref,
          change_summary: version.change_summary,
          restored_from_version: version.restored_from_version,
          author_id: version.author_id,
          created_at: decode_dt(&created_at)?,
        })
      }
      RawAppend::Conflict { actual } => AppendOutcome::Conflict {
        expected: expected_version,
        actual:   decode_version(actual)?,
      },
      RawAppend::DocumentNotFound => AppendOutcome::DocumentNotFound,
    })
  }

  async fn get_version(
    &self,
    document_id:    Uuid,
    version_number: u64,
  ) -> Result<Option<DocumentVersion>> {
    // Nothing is ever stored past `i64::MAX`.
    let Ok(number) = i64::try_from(version_number) else {
      return Ok(None);
    };
    let id_str = encode_uuid(document_id);

    let raw: Option<RawVersion> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {VERSION_COLUMNS} FROM document_versions
                 WHERE document_id = ?1 AND version_number = ?2"
              ),
              rusqlite::params![id_str, number],
              RawVersion::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawVersion::into_version).transpose()
  }

  async fn list_versions(
    &self,
    document_id: Uuid,
    query:       VersionQuery,
  ) -> Result<Option<Page<DocumentVersion>>> {
    let query  = query.normalized();
    let id_str = encode_uuid(document_id);
    // Saturate: the anchor is clamped to the head below anyway.
    let as_of  = query.as_of.map(|a| i64::try_from(a).unwrap_or(i64::MAX));
    let limit  = i64::from(query.page_size);
    let offset = encode_version(query.offset())?;

    let listed: Option<(i64, i64, Vec<RawVersion>)> = self
      .conn
      .call(move |conn| {
        // A read transaction so the head, the count and the rows agree.
        let tx = conn.transaction()?;

        let head: Option<i64> = tx
          .query_row(
            "SELECT current_version_number FROM documents WHERE document_id = ?1",
            rusqlite::params![id_str],
            |r| r.get(0),
          )
          .optional()?;
        let Some(head) = head else {
          return Ok(None);
        };
        let anchor = as_of.map_or(head, |a| a.min(head));

        let total: i64 = tx.query_row(
          "SELECT COUNT(*) FROM document_versions
           WHERE document_id = ?1 AND version_number <= ?2",
          rusqlite::params![id_str, anchor],
          |r| r.get(0),
        )?;

        let rows = {
          let mut stmt = tx.prepare(&format!(
            "SELECT {VERSION_COLUMNS} FROM document_versions
             WHERE document_id = ?1 AND version_number <= ?2
             ORDER BY version_number DESC
             LIMIT ?3 OFFSET ?4"
          ))?;
          stmt
            .query_map(
              rusqlite::params![id_str, anchor, limit, offset],
              RawVersion::from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };

        Ok(Some((anchor, total, rows)))
      })
      .await?;

    let Some((anchor, total, rows)) = listed else {
      return Ok(None);
    };

    let items = rows
      .into_iter()
      .map(RawVersion::into_version)
      .collect::<Result<Vec<_>>>()?;

    Ok(Some(Page::new(
      items,
      query,
      decode_version(total)?,
      decode_version(anchor)?,
    )))
  }
}
