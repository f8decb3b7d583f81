//! [`ContentBackend`] impl storing snapshot payloads in the `content_blobs`
//! table of the same database.

use bytes::Bytes;
use folio_core::content::{ContentBackend, ContentRef};
use rusqlite::OptionalExtension as _;

use crate::{
  Result, SqliteStore,
  encode::{encode_dt, now},
};

impl ContentBackend for SqliteStore {
  type Error = crate::Error;

  async fn put(&self, bytes: Bytes) -> Result<ContentRef> {
    let content_ref = ContentRef::digest(&bytes);
    let key_str     = content_ref.to_string();
    let size        = bytes.len() as i64;
    let at_str      = encode_dt(now());

    self
      .conn
      .call(move |conn| {
        // Same key means same bytes; a repeated put is a no-op.
        conn.execute(
          "INSERT OR IGNORE INTO content_blobs (content_ref, bytes, byte_size, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![key_str, &bytes[..], size, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(content_ref)
  }

  async fn get(&self, content_ref: ContentRef) -> Result<Option<Bytes>> {
    let key_str = content_ref.to_string();

    let blob: Option<Vec<u8>> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT bytes FROM content_blobs WHERE content_ref = ?1",
              rusqlite::params![key_str],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    Ok(blob.map(Bytes::from))
  }
}
