//! Error type for `folio-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] folio_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A version number does not fit SQLite's signed 64-bit integer.
  #[error("version number out of range: {0}")]
  VersionOutOfRange(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
